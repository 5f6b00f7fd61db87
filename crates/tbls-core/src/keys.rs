//! Private and public keys, whole and shared
//!
//! A whole key can be built directly from key material or reconstructed
//! from `t` shares with their Lagrange coefficients. Either way it is the
//! same kind of object and obeys the same invariants: private scalars are
//! never zero and public points are never the identity.

use crate::curve::{
    self, field_from_decimal, field_to_decimal, g2_from_strings, g2_to_strings, hash_to_g1,
    hash_to_g1_with_hint, pairing_check, Fr, G2Affine, G2Projective, HashHint,
};
use crate::lagrange::{lagrange_coeffs, recover};
use crate::sign::{SigShare, Signature};
use crate::types::{ParticipantIndex, ThresholdParams};
use crate::{Error, Result};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

fn non_zero(key: Fr) -> Result<Fr> {
    if key.is_zero() {
        return Err(Error::ZeroKey);
    }
    Ok(key)
}

/// Take the first `t` items of `shares`, failing if there are fewer
fn threshold_prefix<'a, T>(shares: &'a [T], params: &ThresholdParams) -> Result<&'a [T]> {
    let required = params.required();
    if shares.len() < required {
        return Err(Error::ThresholdNotMet {
            required,
            actual: shares.len(),
        });
    }
    Ok(&shares[..required])
}

/// A whole BLS private key
#[derive(Clone)]
pub struct PrivateKey {
    key: Fr,
    params: ThresholdParams,
}

impl PrivateKey {
    /// Wrap a scalar, rejecting zero
    pub fn from_scalar(key: Fr, params: ThresholdParams) -> Result<Self> {
        curve::init();
        Ok(Self {
            key: non_zero(key)?,
            params,
        })
    }

    /// Parse a decimal scalar, rejecting zero
    pub fn from_decimal(s: &str, params: ThresholdParams) -> Result<Self> {
        Self::from_scalar(field_from_decimal(s)?, params)
    }

    /// Reconstruct the private key from the first `t` shares
    ///
    /// The shares' own indices select the Lagrange coefficients, so any
    /// `t` distinct shares give the same key.
    #[instrument(skip(shares), fields(t = params.required(), n = params.total()))]
    pub fn reconstruct(shares: &[PrivateKeyShare], params: ThresholdParams) -> Result<Self> {
        let selected = threshold_prefix(shares, &params)?;
        let indices: Vec<ParticipantIndex> = selected.iter().map(|s| s.index).collect();
        let coeffs = lagrange_coeffs(&params, &indices)?;

        let mut values: Vec<Fr> = selected.iter().map(|s| s.key).collect();
        let key = recover(&coeffs, &values);
        values.zeroize();

        debug!(?indices, "Reconstructed private key from shares");
        Self::from_scalar(key?, params)
    }

    /// Decimal rendering of the key
    pub fn to_decimal(&self) -> Result<String> {
        Ok(field_to_decimal(&non_zero(self.key)?))
    }

    /// Underlying scalar
    pub fn as_scalar(&self) -> &Fr {
        &self.key
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            point: curve::g2_mul_generator(&self.key).into_affine(),
            params: self.params,
        }
    }

    /// Sign a message with the whole key
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        let (hashed, hint) = hash_to_g1(message)?;
        let point = (hashed * self.key).into_affine();
        Ok(Signature::new(point, Some(hint.to_string()), self.params))
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// One participant's share of a private key
#[derive(Clone)]
pub struct PrivateKeyShare {
    key: Fr,
    index: ParticipantIndex,
    params: ThresholdParams,
}

impl PrivateKeyShare {
    /// Wrap a scalar share, rejecting zero and out-of-range indices
    pub fn new(key: Fr, index: ParticipantIndex, params: ThresholdParams) -> Result<Self> {
        curve::init();
        params.check_index(index)?;
        Ok(Self {
            key: non_zero(key)?,
            index,
            params,
        })
    }

    /// Parse a decimal scalar share
    pub fn from_decimal(s: &str, index: ParticipantIndex, params: ThresholdParams) -> Result<Self> {
        Self::new(field_from_decimal(s)?, index, params)
    }

    /// Decimal rendering of the share
    pub fn to_decimal(&self) -> Result<String> {
        Ok(field_to_decimal(&non_zero(self.key)?))
    }

    pub fn as_scalar(&self) -> &Fr {
        &self.key
    }

    pub fn index(&self) -> ParticipantIndex {
        self.index
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Lift this share into G2
    pub fn public_key_share(&self) -> PublicKeyShare {
        PublicKeyShare {
            point: curve::g2_mul_generator(&self.key).into_affine(),
            index: self.index,
            params: self.params,
        }
    }

    /// Produce this participant's signature share on `message`
    pub fn sign(&self, message: &[u8]) -> Result<SigShare> {
        let (hashed, hint) = hash_to_g1(message)?;
        let point = (hashed * self.key).into_affine();
        SigShare::new(point, self.index, Some(hint.to_string()), self.params)
    }
}

impl Drop for PrivateKeyShare {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for PrivateKeyShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyShare")
            .field("index", &self.index)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A whole BLS public key in G2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    point: G2Affine,
    params: ThresholdParams,
}

impl PublicKey {
    /// Wrap a G2 point, rejecting the identity
    pub fn from_point(point: G2Affine, params: ThresholdParams) -> Result<Self> {
        curve::init();
        if point.is_zero() {
            return Err(Error::ZeroKey);
        }
        Ok(Self { point, params })
    }

    pub fn from_private_key(key: &PrivateKey) -> Self {
        key.public_key()
    }

    /// Parse `[X.c0, X.c1, Y.c0, Y.c1]`
    pub fn from_strings(coords: &[String; 4], params: ThresholdParams) -> Result<Self> {
        Self::from_point(g2_from_strings(coords)?, params)
    }

    /// Affine coordinates as `[X.c0, X.c1, Y.c0, Y.c1]`
    pub fn to_strings(&self) -> [String; 4] {
        g2_to_strings(&self.point)
    }

    /// Reconstruct the public key from the first `t` public key shares
    #[instrument(skip(shares), fields(t = params.required(), n = params.total()))]
    pub fn reconstruct(shares: &[PublicKeyShare], params: ThresholdParams) -> Result<Self> {
        let selected = threshold_prefix(shares, &params)?;
        let indices: Vec<ParticipantIndex> = selected.iter().map(|s| s.index).collect();
        let coeffs = lagrange_coeffs(&params, &indices)?;
        let points: Vec<G2Projective> = selected.iter().map(|s| s.point.into_group()).collect();
        let point = recover(&coeffs, &points)?.into_affine();

        debug!(?indices, "Reconstructed public key from shares");
        Self::from_point(point, params)
    }

    pub fn point(&self) -> &G2Affine {
        &self.point
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Compressed point, hex encoded
    pub fn to_hex(&self) -> Result<String> {
        curve::to_compressed_hex(&self.point)
    }

    /// Check `e(signature, g2) == e(H(message), self)`.
    ///
    /// Returns `Ok(false)` for a signature that does not verify, including
    /// one whose hint does not match the message. A signature made under
    /// different threshold parameters is an error.
    pub fn verify_sig(&self, message: &[u8], signature: &Signature) -> Result<bool> {
        if signature.params() != self.params {
            return Err(Error::InvalidThreshold {
                required: signature.params().required(),
                total: signature.params().total(),
            });
        }

        let hashed = match signature.hint() {
            Some(hint) => {
                match hint
                    .parse::<HashHint>()
                    .and_then(|hint| hash_to_g1_with_hint(message, &hint))
                {
                    Ok(point) => point,
                    Err(e) => {
                        warn!(error = %e, "Signature hint rejected");
                        return Ok(false);
                    }
                }
            }
            None => hash_to_g1(message)?.0,
        };

        let valid = pairing_check(signature.point(), &hashed, &self.point);
        info!(valid, "Verified signature");
        Ok(valid)
    }
}

/// One participant's share of the public key, `share · g2`.
///
/// Deserialization runs the checks of [`PublicKeyShare::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPublicKeyShare")]
pub struct PublicKeyShare {
    #[serde(with = "crate::types::g2_serde")]
    point: G2Affine,
    index: ParticipantIndex,
    params: ThresholdParams,
}

#[derive(Deserialize)]
struct RawPublicKeyShare {
    #[serde(with = "crate::types::g2_serde")]
    point: G2Affine,
    index: ParticipantIndex,
    params: ThresholdParams,
}

impl TryFrom<RawPublicKeyShare> for PublicKeyShare {
    type Error = Error;

    fn try_from(raw: RawPublicKeyShare) -> Result<Self> {
        PublicKeyShare::new(raw.point, raw.index, raw.params)
    }
}

impl PublicKeyShare {
    /// Wrap a G2 point, rejecting the identity and out-of-range indices
    pub fn new(point: G2Affine, index: ParticipantIndex, params: ThresholdParams) -> Result<Self> {
        curve::init();
        params.check_index(index)?;
        if point.is_zero() {
            return Err(Error::ZeroKey);
        }
        Ok(Self {
            point,
            index,
            params,
        })
    }

    pub fn from_private_key_share(share: &PrivateKeyShare) -> Self {
        share.public_key_share()
    }

    pub fn point(&self) -> &G2Affine {
        &self.point
    }

    pub fn index(&self) -> ParticipantIndex {
        self.index
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Check a single signature share against this public key share.
    ///
    /// Lets a collector screen out a misbehaving signer before merging.
    pub fn verify_share(&self, message: &[u8], share: &SigShare) -> Result<bool> {
        if share.index() != self.index {
            return Err(Error::Misaddressed {
                expected: self.index,
                actual: share.index(),
            });
        }
        let (hashed, _) = hash_to_g1(message)?;
        let valid = pairing_check(share.point(), &hashed, &self.point);
        if !valid {
            warn!(index = self.index, "Signature share does not verify");
        }
        Ok(valid)
    }
}
