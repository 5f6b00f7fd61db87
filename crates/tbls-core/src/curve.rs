//! BN254 curve adapter
//!
//! Everything the threshold layer needs from the pairing library lives here:
//! field and group types, the pairing check, hashing messages onto G1 and the
//! decimal string encodings used for key files.
//!
//! Signatures live in G1, public keys in G2.

use crate::{Error, Result};
use ark_ec::{pairing::Pairing, short_weierstrass::SWCurveConfig, AffineRepr};
use ark_ff::{Field, One, PrimeField, UniformRand, Zero};
use ark_serialize::CanonicalSerialize;
use once_cell::sync::OnceCell;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G1Projective, G2Affine, G2Projective};

type G1Config = ark_bn254::g1::Config;
type G2Prepared = <Bn254 as Pairing>::G2Prepared;

/// Upper bound on try-and-increment steps when hashing to G1
pub const MAX_HASH_ATTEMPTS: u64 = 256;

static G2_GENERATOR_PREPARED: OnceCell<G2Prepared> = OnceCell::new();

/// Initialize the curve library.
///
/// Idempotent and thread-safe: the first call precomputes the pairing lines
/// of the G2 generator, every later call returns immediately.
pub fn init() {
    let _ = g2_generator_prepared();
}

fn g2_generator_prepared() -> &'static G2Prepared {
    G2_GENERATOR_PREPARED.get_or_init(|| {
        debug!("Preparing G2 generator for pairing checks");
        G2Prepared::from(G2Affine::generator())
    })
}

/// Draw a uniformly random scalar
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}

/// Lift a scalar into G2 (`s * g2`)
pub fn g2_mul_generator(scalar: &Fr) -> G2Projective {
    G2Affine::generator() * *scalar
}

/// Check `e(signature, g2) == e(hashed, public_key)`
pub fn pairing_check(signature: &G1Affine, hashed: &G1Affine, public_key: &G2Affine) -> bool {
    let lhs = Bn254::pairing(*signature, g2_generator_prepared().clone());
    let rhs = Bn254::pairing(*hashed, *public_key);
    lhs == rhs
}

/// Auxiliary data produced while hashing a message onto G1.
///
/// `counter` is the number of increments applied to the hashed x coordinate,
/// `y` the chosen (smaller) root. Rendered as `"<y>:<counter>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashHint {
    pub y: Fq,
    pub counter: u64,
}

impl fmt::Display for HashHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", field_to_decimal(&self.y), self.counter)
    }
}

impl FromStr for HashHint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (y, counter) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidEncoding(format!("malformed hint: {:?}", s)))?;
        let counter = counter
            .parse()
            .map_err(|_| Error::InvalidEncoding(format!("malformed hint counter: {:?}", counter)))?;
        Ok(Self {
            y: field_from_decimal(y)?,
            counter,
        })
    }
}

fn hashed_x(message: &[u8]) -> Fq {
    Fq::from_be_bytes_mod_order(&Sha256::digest(message))
}

// y^2 = x^3 + b
fn curve_rhs(x: &Fq) -> Fq {
    x.square() * x + G1Config::COEFF_B
}

fn is_square(value: &Fq) -> bool {
    value.is_zero() || value.pow(Fq::MODULUS_MINUS_ONE_DIV_TWO).is_one()
}

/// Hash an arbitrary message onto G1 by try-and-increment over SHA-256.
pub fn hash_to_g1(message: &[u8]) -> Result<(G1Affine, HashHint)> {
    let mut x = hashed_x(message);
    for counter in 0..MAX_HASH_ATTEMPTS {
        if let Some(point) = G1Affine::get_point_from_x_unchecked(x, false) {
            return Ok((point, HashHint { y: point.y, counter }));
        }
        x += Fq::one();
    }
    Err(Error::HashToCurve(format!(
        "no point found after {} attempts",
        MAX_HASH_ATTEMPTS
    )))
}

/// Rebuild the G1 image of `message` from a hint without taking a square root.
///
/// Fails if the hint does not describe the point [`hash_to_g1`] would produce.
pub fn hash_to_g1_with_hint(message: &[u8], hint: &HashHint) -> Result<G1Affine> {
    if hint.counter >= MAX_HASH_ATTEMPTS {
        return Err(Error::HashToCurve(format!(
            "hint counter {} out of range",
            hint.counter
        )));
    }

    let mut x = hashed_x(message);
    for _ in 0..hint.counter {
        if is_square(&curve_rhs(&x)) {
            return Err(Error::HashToCurve("hint skips a valid point".into()));
        }
        x += Fq::one();
    }

    let point = G1Affine::new_unchecked(x, hint.y);
    if !point.is_on_curve() || hint.y > -hint.y {
        return Err(Error::HashToCurve("hint does not match message".into()));
    }
    Ok(point)
}

/// Decimal rendering of a prime field element
pub fn field_to_decimal<F: PrimeField>(value: &F) -> String {
    value.into_bigint().to_string()
}

/// Parse a canonical decimal field element (no sign, no leading zeros, below the modulus)
pub fn field_from_decimal<F: PrimeField>(s: &str) -> Result<F> {
    let value = F::from_str(s)
        .map_err(|_| Error::InvalidEncoding(format!("not a field element: {:?}", s)))?;
    if field_to_decimal(&value) != s {
        return Err(Error::InvalidEncoding(format!(
            "non-canonical field element: {:?}",
            s
        )));
    }
    Ok(value)
}

/// Affine coordinates of a G1 point as `[X, Y]`
pub fn g1_to_strings(point: &G1Affine) -> [String; 2] {
    [field_to_decimal(&point.x), field_to_decimal(&point.y)]
}

/// Parse `[X, Y]`, rejecting points off the curve
pub fn g1_from_strings(coords: &[String; 2]) -> Result<G1Affine> {
    let point = G1Affine::new_unchecked(field_from_decimal(&coords[0])?, field_from_decimal(&coords[1])?);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::InvalidEncoding("G1 point is not on the curve".into()));
    }
    Ok(point)
}

/// Affine coordinates of a G2 point as `[X.c0, X.c1, Y.c0, Y.c1]`
pub fn g2_to_strings(point: &G2Affine) -> [String; 4] {
    [
        field_to_decimal(&point.x.c0),
        field_to_decimal(&point.x.c1),
        field_to_decimal(&point.y.c0),
        field_to_decimal(&point.y.c1),
    ]
}

/// Parse `[X.c0, X.c1, Y.c0, Y.c1]`, rejecting points off the curve or
/// outside the prime-order subgroup
pub fn g2_from_strings(coords: &[String; 4]) -> Result<G2Affine> {
    let x = Fq2::new(field_from_decimal(&coords[0])?, field_from_decimal(&coords[1])?);
    let y = Fq2::new(field_from_decimal(&coords[2])?, field_from_decimal(&coords[3])?);
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::InvalidEncoding(
            "G2 point is not in the prime order subgroup".into(),
        ));
    }
    Ok(point)
}

/// Compressed canonical encoding, hex encoded
pub fn to_compressed_hex<T: CanonicalSerialize>(value: &T) -> Result<String> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value.serialize_compressed(&mut bytes)?;
    Ok(hex::encode(bytes))
}
