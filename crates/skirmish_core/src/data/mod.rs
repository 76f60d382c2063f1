//! Data structures for archetype configuration.
//!
//! All structs here are designed to be deserialized from RON text.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! parses text handed to it. File loading is handled by `skirmish_headless`.

mod archetype_data;

pub use archetype_data::{ArchetypeCatalog, ArchetypeData, AttackData};

use serde::de::DeserializeOwned;

use crate::error::{EncounterError, Result};

/// Parse RON text, tagging failures with `origin`.
pub(crate) fn parse_ron<T: DeserializeOwned>(text: &str, origin: &str) -> Result<T> {
    ron::from_str(text).map_err(|e| EncounterError::DataParseError {
        path: origin.to_string(),
        message: e.to_string(),
    })
}
