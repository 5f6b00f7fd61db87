//! A single participant's partial signature

use super::{decode_point, encode_point};
use crate::curve::G1Affine;
use crate::types::{ParticipantIndex, ThresholdParams};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Partial signature: `H(m) · share`, tagged with the signer's index and
/// the hint produced while hashing the message.
///
/// Deserialization checks the signer index like [`SigShare::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSigShare")]
pub struct SigShare {
    #[serde(with = "crate::types::g1_serde")]
    point: G1Affine,
    index: ParticipantIndex,
    hint: Option<String>,
    params: ThresholdParams,
}

impl SigShare {
    /// Create a signature share, rejecting out-of-range signer indices
    pub fn new(
        point: G1Affine,
        index: ParticipantIndex,
        hint: Option<String>,
        params: ThresholdParams,
    ) -> Result<Self> {
        params.check_index(index)?;
        Ok(Self {
            point,
            index,
            hint,
            params,
        })
    }

    /// Parse `"<x>:<y>[:<hint>]"` for the given signer
    pub fn from_string(s: &str, index: ParticipantIndex, params: ThresholdParams) -> Result<Self> {
        let (point, hint) = decode_point(s)?;
        Self::new(point, index, hint, params)
    }

    pub fn point(&self) -> &G1Affine {
        &self.point
    }

    /// Signer index
    pub fn index(&self) -> ParticipantIndex {
        self.index
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }
}

#[derive(Deserialize)]
struct RawSigShare {
    #[serde(with = "crate::types::g1_serde")]
    point: G1Affine,
    index: ParticipantIndex,
    hint: Option<String>,
    params: ThresholdParams,
}

impl TryFrom<RawSigShare> for SigShare {
    type Error = Error;

    fn try_from(raw: RawSigShare) -> Result<Self> {
        SigShare::new(raw.point, raw.index, raw.hint, raw.params)
    }
}

impl fmt::Display for SigShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_point(&self.point, self.hint()))
    }
}
