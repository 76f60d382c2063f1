//! Encounter data loading.
//!
//! The core only parses text; this module finds and reads the RON files.
//! A data directory holds up to two files:
//!
//! - `archetypes.ron`: a list of `ArchetypeData`
//! - `encounter.ron`: an `EncounterConfig`
//!
//! Either file may be absent, in which case the stock presets or the
//! default tuning are used.

use std::fs;
use std::path::{Path, PathBuf};

use skirmish_core::config::EncounterConfig;
use skirmish_core::data::ArchetypeCatalog;

use crate::scenario::ScenarioError;

/// Archetype list file name inside a data directory.
pub const ARCHETYPES_FILE: &str = "archetypes.ron";
/// Tuning file name inside a data directory.
pub const CONFIG_FILE: &str = "encounter.ron";

fn read(path: &Path) -> Result<String, ScenarioError> {
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Load and validate an archetype catalog from a RON file.
pub fn load_catalog(path: &Path) -> Result<ArchetypeCatalog, ScenarioError> {
    let text = read(path)?;
    let catalog = ArchetypeCatalog::from_ron(&text, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), archetypes = catalog.len(), "loaded archetypes");
    Ok(catalog)
}

/// Load and validate encounter tuning from a RON file.
pub fn load_config(path: &Path) -> Result<EncounterConfig, ScenarioError> {
    let text = read(path)?;
    let config = EncounterConfig::from_ron(&text, &path.display().to_string())?;
    tracing::debug!(path = %path.display(), "loaded encounter config");
    Ok(config)
}

/// Load whatever a data directory provides, falling back to built-in data.
pub fn load_data_dir(dir: &Path) -> Result<(EncounterConfig, ArchetypeCatalog), ScenarioError> {
    if !dir.is_dir() {
        return Err(ScenarioError::FileNotFound(dir.display().to_string()));
    }

    let config_path = dir.join(CONFIG_FILE);
    let config = if config_path.exists() {
        load_config(&config_path)?
    } else {
        tracing::info!(dir = %dir.display(), "no {CONFIG_FILE}, using default tuning");
        EncounterConfig::default()
    };

    let catalog_path = dir.join(ARCHETYPES_FILE);
    let catalog = if catalog_path.exists() {
        load_catalog(&catalog_path)?
    } else {
        tracing::info!(dir = %dir.display(), "no {ARCHETYPES_FILE}, using stock presets");
        ArchetypeCatalog::builtin()
    };

    Ok((config, catalog))
}

/// Resolve the default data directory.
///
/// Looks in:
/// 1. Environment variable `SKIRMISH_DATA_DIR`
/// 2. `./assets/data/` (repo root)
/// 3. `../../assets/data/` (running from a crate directory)
pub fn default_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SKIRMISH_DATA_DIR") {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Some(path);
        }
    }

    ["assets/data", "../../assets/data"]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::error::EncounterError;

    const BRUTE: &str = r#"[
        ArchetypeData(
            name: "brute",
            label: "Brute",
            faction: allied,
            max_hp: 300,
            speed: 1.5,
            attack: AttackData(damage: 20, range: 120.0, cooldown: 60, duration: 30, swing_frame: 10),
        ),
    ]"#;

    #[test]
    fn test_load_catalog_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ARCHETYPES_FILE);
        fs::write(&path, BRUTE).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["brute"]);
        assert_eq!(catalog.get("brute").unwrap().max_hp, 300);
    }

    #[test]
    fn test_invalid_archetype_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ARCHETYPES_FILE);
        fs::write(&path, BRUTE.replace("swing_frame: 10", "swing_frame: 30")).unwrap();

        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Encounter(EncounterError::InvalidArchetype { .. })
        ));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "EncounterConfig(sprite_buffer: \"wide\")").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_empty_data_dir_falls_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let (config, catalog) = load_data_dir(dir.path()).unwrap();
        assert_eq!(config, EncounterConfig::default());
        assert_eq!(catalog.len(), ArchetypeCatalog::builtin().len());
    }

    #[test]
    fn test_data_dir_uses_present_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ARCHETYPES_FILE), BRUTE).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "EncounterConfig(removal_delay_ticks: 120)",
        )
        .unwrap();

        let (config, catalog) = load_data_dir(dir.path()).unwrap();
        assert_eq!(config.removal_delay_ticks, 120);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let err = load_data_dir(Path::new("no/such/dir")).unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_shipped_data_is_valid() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/data");
        let (config, catalog) = load_data_dir(&dir).unwrap();
        assert_eq!(config, EncounterConfig::default());
        for name in ArchetypeCatalog::builtin().names() {
            assert_eq!(catalog.get(name), ArchetypeCatalog::builtin().get(name));
        }
    }
}
