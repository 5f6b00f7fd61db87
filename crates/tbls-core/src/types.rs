//! Core types shared by key generation, key shares and signing

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// 1-based index of a participant, used as the polynomial evaluation point
pub type ParticipantIndex = usize;

/// Threshold parameters `(t, n)`: any `required` of `total` participants
/// can sign or reconstruct.
///
/// Always satisfies `1 <= required <= total`. Deserialization goes through
/// the same check as [`ThresholdParams::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawThresholdParams", into = "RawThresholdParams")]
pub struct ThresholdParams {
    required: usize,
    total: usize,
}

impl ThresholdParams {
    /// Create new threshold parameters
    pub fn new(required: usize, total: usize) -> Result<Self> {
        if required == 0 || total == 0 || required > total {
            return Err(Error::InvalidThreshold { required, total });
        }
        Ok(Self { required, total })
    }

    /// Number of participants needed to sign (`t`)
    pub fn required(&self) -> usize {
        self.required
    }

    /// Number of participants holding shares (`n`)
    pub fn total(&self) -> usize {
        self.total
    }

    /// Fails unless `1 <= index <= n`
    pub fn check_index(&self, index: ParticipantIndex) -> Result<()> {
        if index == 0 || index > self.total {
            return Err(Error::IndexOutOfRange {
                index,
                total: self.total,
            });
        }
        Ok(())
    }

    /// All valid participant indices, in ascending order
    pub fn indices(&self) -> RangeInclusive<ParticipantIndex> {
        1..=self.total
    }
}

#[derive(Serialize, Deserialize)]
struct RawThresholdParams {
    t: usize,
    n: usize,
}

impl TryFrom<RawThresholdParams> for ThresholdParams {
    type Error = Error;

    fn try_from(raw: RawThresholdParams) -> Result<Self> {
        ThresholdParams::new(raw.t, raw.n)
    }
}

impl From<ThresholdParams> for RawThresholdParams {
    fn from(params: ThresholdParams) -> Self {
        Self {
            t: params.required,
            n: params.total,
        }
    }
}

/// Serde adapter: `Fr` as a decimal string
pub(crate) mod fr_serde {
    use crate::curve::{field_from_decimal, field_to_decimal, Fr};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&field_to_decimal(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        field_from_decimal(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: G1 point as `[X, Y]` decimal strings
pub(crate) mod g1_serde {
    use crate::curve::{g1_from_strings, g1_to_strings, G1Affine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(point: &G1Affine, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        g1_to_strings(point).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<G1Affine, D::Error>
    where
        D: Deserializer<'de>,
    {
        let coords = <[String; 2]>::deserialize(deserializer)?;
        g1_from_strings(&coords).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: G2 point as `[X.c0, X.c1, Y.c0, Y.c1]` decimal strings
pub(crate) mod g2_serde {
    use crate::curve::{g2_from_strings, g2_to_strings, G2Affine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(point: &G2Affine, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        g2_to_strings(point).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<G2Affine, D::Error>
    where
        D: Deserializer<'de>,
    {
        let coords = <[String; 4]>::deserialize(deserializer)?;
        g2_from_strings(&coords).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: a list of G2 points
pub(crate) mod g2_vec_serde {
    use crate::curve::{g2_from_strings, g2_to_strings, G2Affine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(points: &[G2Affine], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: Vec<[String; 4]> = points.iter().map(g2_to_strings).collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<G2Affine>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Vec::<[String; 4]>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|coords| g2_from_strings(coords).map_err(serde::de::Error::custom))
            .collect()
    }
}
