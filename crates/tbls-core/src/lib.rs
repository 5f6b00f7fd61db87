//! # tbls-core
//!
//! Threshold BLS signatures over BN254 with dealer-free key generation.
//!
//! This crate provides:
//! - Distributed Key Generation (DKG) with optional Feldman checks
//! - Private and public keys, whole and shared
//! - Signature shares, their collection and recovery of the group signature
//!
//! ## Scheme
//!
//! Private scalars live in `Fr`, public keys in G2 and signatures in G1.
//! Any `t` of the `n` participants can produce a signature that verifies
//! against the single common public key; fewer than `t` learn nothing.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tbls_core::{keygen::DkgSession, sign::SigShareSet, ThresholdParams};
//!
//! let params = ThresholdParams::new(2, 3)?;
//! let session = DkgSession::new(params, 1)?;
//! // ... exchange commitment and contribution messages ...
//! let output = session.finish(true)?;
//!
//! let mut set = SigShareSet::new(params);
//! set.add_sig_share(output.key_share.sign(message)?)?;
//! // ... add shares from other signers ...
//! let signature = set.merge()?;
//! assert!(output.public_key.verify_sig(message, &signature)?);
//! ```

pub mod curve;
pub mod error;
pub mod keygen;
pub mod keys;
pub mod lagrange;
pub mod sign;
pub mod types;

pub use curve::init;
pub use error::{Error, Result};
pub use keys::{PrivateKey, PrivateKeyShare, PublicKey, PublicKeyShare};
pub use sign::{SigShare, SigShareSet, Signature};
pub use types::{ParticipantIndex, ThresholdParams};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
