//! Board length units.
//!
//! Geometry is held in integer nanometres so that containment and
//! intersection tests are exact. Board documents and every tool argument or
//! report use millimetres; conversion happens here and nowhere else.

/// A linear board coordinate in nanometres.
pub type Coord = i64;

/// Internal units per millimetre (1 nm resolution).
pub const IU_PER_MM: f64 = 1_000_000.0;

/// Largest magnitude a document length may have (mm). Sums and doubled
/// margins of such lengths stay far inside the `Coord` range.
pub const MAX_DOCUMENT_MM: f64 = 1_000_000.0;

/// Converts internal units to millimetres.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_mm(value: Coord) -> f64 {
    value as f64 / IU_PER_MM
}

/// Converts millimetres to internal units, rounding to the nearest nanometre.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn from_mm(mm: f64) -> Coord {
    (mm * IU_PER_MM).round() as Coord
}

/// Converts an area in internal units squared to square millimetres.
#[must_use]
pub fn area_to_mm2(width: Coord, height: Coord) -> f64 {
    to_mm(width) * to_mm(height)
}

/// Serde adapter storing a [`Coord`] as a millimetre float.
///
/// Use with `#[serde(with = "crate::board::units::mm")]`.
pub mod mm {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{from_mm, to_mm, Coord};

    /// Serialises internal units as millimetres.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    #[allow(clippy::trivially_copy_pass_by_ref)] // serde's `with` requires &T
    pub fn serialize<S: Serializer>(value: &Coord, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(to_mm(*value))
    }

    /// Deserialises millimetres into internal units.
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric or non-finite values and for lengths
    /// beyond [`MAX_DOCUMENT_MM`](super::MAX_DOCUMENT_MM).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coord, D::Error> {
        let mm = f64::deserialize(deserializer)?;
        if !mm.is_finite() {
            return Err(serde::de::Error::custom("length must be a finite number"));
        }
        if mm.abs() > super::MAX_DOCUMENT_MM {
            return Err(serde::de::Error::custom(format!(
                "length {mm} mm is outside the allowed range of +/-{} mm",
                super::MAX_DOCUMENT_MM
            )));
        }
        Ok(from_mm(mm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mm_conversion() {
        assert_eq!(from_mm(1.0), 1_000_000);
        assert_eq!(from_mm(0.2), 200_000);
        assert_eq!(from_mm(-2.54), -2_540_000);
        assert!((to_mm(2_100_000) - 2.1).abs() < 1e-12);
    }

    #[test]
    fn document_lengths_are_bounded() {
        #[derive(Debug, serde::Deserialize)]
        struct Length {
            #[serde(with = "mm")]
            value: Coord,
        }

        let ok: Length = serde_json::from_str(r#"{"value": 2.5}"#).unwrap();
        assert_eq!(ok.value, 2_500_000);

        let err = serde_json::from_str::<Length>(r#"{"value": 1e13}"#).unwrap_err();
        assert!(err.to_string().contains("outside the allowed range"));
        assert!(serde_json::from_str::<Length>(r#"{"value": -1e13}"#).is_err());
    }

    #[test]
    fn area_conversion() {
        assert!((area_to_mm2(from_mm(2.0), from_mm(3.5)) - 7.0).abs() < 1e-9);
    }
}
