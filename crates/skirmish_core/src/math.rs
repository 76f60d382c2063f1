//! Fixed-point math utilities for deterministic simulation.
//!
//! All encounter math uses fixed-point arithmetic so that the same
//! inputs produce bit-identical results on every platform. Floats only
//! appear at the edges: data files and render views.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Half-width of the playable world, in world units.
///
/// Commands refuse points outside `-WORLD_LIMIT..=WORLD_LIMIT` on either
/// axis and movement keeps boxes inside it, so differences between any
/// two positions stay far from the edge of [`Fixed`]'s range.
pub const WORLD_LIMIT: Fixed = Fixed::from_bits(1_000_000_i64 << 32);

/// Fixed-point 2D vector.
///
/// Component-wise arithmetic saturates instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers written as plain decimals.
///
/// Data files and JSON views are human-authored or human-read, so values
/// travel as decimal numbers and are converted to [`Fixed`] exactly once,
/// at load time.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        super::fixed_from_decimal(raw)
            .ok_or_else(|| D::Error::custom(format!("{raw} is not representable as fixed-point")))
    }
}

/// Convert a decimal into [`Fixed`], rejecting non-finite or out-of-range values.
#[must_use]
pub fn fixed_from_decimal(value: f64) -> Option<Fixed> {
    if !value.is_finite() {
        return None;
    }
    Fixed::checked_from_num(value)
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Create a vector from whole-number coordinates.
    #[must_use]
    pub fn from_int(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == Fixed::ZERO && self.y == Fixed::ZERO
    }

    /// Squared length, saturating at [`Fixed::MAX`].
    #[must_use]
    pub fn length_squared(self) -> Fixed {
        let bits = self.length_squared_bits() >> 32;
        Fixed::from_bits(i64::try_from(bits).unwrap_or(i64::MAX))
    }

    /// Euclidean length, exact to the last fractional bit at any magnitude.
    #[must_use]
    pub fn length(self) -> Fixed {
        let root = isqrt_u128(self.length_squared_bits());
        Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
    }

    /// Sum of squared raw components, in units of 2^-64.
    ///
    /// Each component is below 2^63 in magnitude, so the sum fits in 128 bits.
    fn length_squared_bits(self) -> u128 {
        let x = u128::from(self.x.to_bits().unsigned_abs());
        let y = u128::from(self.y.to_bits().unsigned_abs());
        x * x + y * y
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).length_squared()
    }

    /// Straight-line distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        (self - other).length()
    }

    /// Whether both coordinates lie within [`WORLD_LIMIT`].
    #[must_use]
    pub fn within_world(self) -> bool {
        let world = -WORLD_LIMIT..=WORLD_LIMIT;
        world.contains(&self.x) && world.contains(&self.y)
    }

    /// Clamp both coordinates into [`WORLD_LIMIT`].
    #[must_use]
    pub fn clamp_to_world(self) -> Self {
        Self::new(
            self.x.clamp(-WORLD_LIMIT, WORLD_LIMIT),
            self.y.clamp(-WORLD_LIMIT, WORLD_LIMIT),
        )
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The result never exceeds unit length. The zero vector normalizes
    /// to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Square root of a fixed-point number, exact to the last fractional bit.
///
/// Returns the floor of the true root. Negative inputs yield zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    // sqrt(bits / 2^32) * 2^32 == sqrt(bits * 2^32)
    let scaled = u128::from(value.to_bits().unsigned_abs()) << 32;
    let root = isqrt_u128(scaled);
    Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
}

/// Integer square root (floor) by Newton's method from above.
fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}
