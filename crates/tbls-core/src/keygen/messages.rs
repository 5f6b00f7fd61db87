//! DKG message types

use crate::curve::{Fr, G2Affine};
use crate::types::ParticipantIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Broadcast: commitments `a_k · g2` to the sender's polynomial.
///
/// The first commitment is the sender's public key contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentMessage {
    /// Sender index
    pub from: ParticipantIndex,
    #[serde(with = "crate::types::g2_vec_serde")]
    pub commitments: Vec<G2Affine>,
}

/// Point to point: the sender's polynomial evaluated at the recipient's index
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ContributionMessage {
    #[zeroize(skip)]
    pub from: ParticipantIndex,
    #[zeroize(skip)]
    pub to: ParticipantIndex,
    #[serde(with = "crate::types::fr_serde")]
    pub value: Fr,
}

impl fmt::Debug for ContributionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContributionMessage")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}
