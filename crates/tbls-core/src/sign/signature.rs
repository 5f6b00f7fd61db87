//! Whole BLS signature

use super::{decode_point, encode_point};
use crate::curve::{self, G1Affine};
use crate::keys::PublicKey;
use crate::types::ThresholdParams;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A group signature in G1, either made directly with a whole key or
/// recovered from a set of signature shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "crate::types::g1_serde")]
    point: G1Affine,
    hint: Option<String>,
    params: ThresholdParams,
}

impl Signature {
    pub fn new(point: G1Affine, hint: Option<String>, params: ThresholdParams) -> Self {
        Self {
            point,
            hint,
            params,
        }
    }

    /// Parse `"<x>:<y>[:<hint>]"`
    pub fn from_string(s: &str, params: ThresholdParams) -> Result<Self> {
        let (point, hint) = decode_point(s)?;
        Ok(Self::new(point, hint, params))
    }

    pub fn point(&self) -> &G1Affine {
        &self.point
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Compressed point, hex encoded
    pub fn to_hex(&self) -> Result<String> {
        curve::to_compressed_hex(&self.point)
    }

    /// Verify against a public key, see [`PublicKey::verify_sig`]
    pub fn verify(&self, message: &[u8], public_key: &PublicKey) -> Result<bool> {
        public_key.verify_sig(message, self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_point(&self.point, self.hint()))
    }
}
