//! Distributed Key Generation (DKG) module
//!
//! Joint-Feldman style key generation: every participant deals a random
//! polynomial, sends one evaluation to each peer and broadcasts commitments.
//! Each participant's key share is the sum of the evaluations it received;
//! the common public key is the sum of every dealer's `a_0 · g2`.

mod dkg;
mod messages;

pub use dkg::{Dkg, Polynomial};
pub use messages::*;

use crate::curve::{Fr, G2Affine};
use crate::keys::{PrivateKeyShare, PublicKey};
use crate::types::{ParticipantIndex, ThresholdParams};
use crate::{Error, Result};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Outcome of a completed DKG for one participant
#[derive(Debug, Clone)]
pub struct DkgOutput {
    pub key_share: PrivateKeyShare,
    pub public_key: PublicKey,
}

/// DKG state machine of a single participant
pub struct DkgSession {
    dkg: Dkg,
    index: ParticipantIndex,
    polynomial: Polynomial,
    commitments: BTreeMap<ParticipantIndex, Vec<G2Affine>>,
    contributions: BTreeMap<ParticipantIndex, Fr>,
}

impl DkgSession {
    /// Start a session for participant `index`, drawing its polynomial from
    /// the OS entropy source
    pub fn new(params: ThresholdParams, index: ParticipantIndex) -> Result<Self> {
        Self::with_rng(params, index, &mut OsRng)
    }

    pub fn with_rng<R: RngCore + CryptoRng>(
        params: ThresholdParams,
        index: ParticipantIndex,
        rng: &mut R,
    ) -> Result<Self> {
        params.check_index(index)?;
        let dkg = Dkg::new(params);
        let polynomial = dkg.generate_polynomial_with_rng(rng);
        Ok(Self {
            dkg,
            index,
            polynomial,
            commitments: BTreeMap::new(),
            contributions: BTreeMap::new(),
        })
    }

    pub fn index(&self) -> ParticipantIndex {
        self.index
    }

    pub fn params(&self) -> ThresholdParams {
        self.dkg.params()
    }

    /// Commitments to broadcast to every participant, including ourselves
    pub fn commitment_message(&self) -> CommitmentMessage {
        CommitmentMessage {
            from: self.index,
            commitments: self.dkg.commitments(&self.polynomial),
        }
    }

    /// One message per participant, including the one addressed to ourselves
    pub fn contribution_messages(&self) -> Result<Vec<ContributionMessage>> {
        let values = self.dkg.secret_key_contribution(&self.polynomial)?;
        Ok(values
            .into_iter()
            .zip(self.params().indices())
            .map(|(value, to)| ContributionMessage {
                from: self.index,
                to,
                value,
            })
            .collect())
    }

    pub fn receive_commitment(&mut self, message: CommitmentMessage) -> Result<()> {
        let params = self.params();
        params.check_index(message.from)?;
        if message.commitments.len() != params.required() {
            return Err(Error::LengthMismatch {
                expected: params.required(),
                actual: message.commitments.len(),
            });
        }
        if self.commitments.contains_key(&message.from) {
            warn!(from = message.from, "Rejected duplicate commitments");
            return Err(Error::DuplicateIndex(message.from));
        }

        debug!(from = message.from, "Received commitments");
        self.commitments.insert(message.from, message.commitments);
        Ok(())
    }

    pub fn receive_contribution(&mut self, message: ContributionMessage) -> Result<()> {
        if message.to != self.index {
            return Err(Error::Misaddressed {
                expected: self.index,
                actual: message.to,
            });
        }
        self.params().check_index(message.from)?;
        if self.contributions.contains_key(&message.from) {
            warn!(from = message.from, "Rejected duplicate contribution");
            return Err(Error::DuplicateIndex(message.from));
        }

        debug!(from = message.from, "Received contribution");
        self.contributions.insert(message.from, message.value);
        Ok(())
    }

    /// Whether every participant's commitments and contribution arrived
    pub fn is_complete(&self) -> bool {
        let total = self.params().total();
        self.commitments.len() == total && self.contributions.len() == total
    }

    /// Check every received contribution against its sender's commitments
    pub fn verify_contributions(&self) -> Result<()> {
        for (&from, value) in &self.contributions {
            let commitments = self
                .commitments
                .get(&from)
                .ok_or(Error::MissingCommitments(from))?;
            self.dkg
                .verify_contribution(from, commitments, self.index, value)?;
        }
        Ok(())
    }

    /// Combine the received contributions into this participant's key share
    /// and the common public key. With `verify`, contributions are checked
    /// against the commitments first.
    #[instrument(skip(self), fields(index = self.index))]
    pub fn finish(self, verify: bool) -> Result<DkgOutput> {
        let total = self.params().total();
        for received in [self.commitments.len(), self.contributions.len()] {
            if received != total {
                return Err(Error::LengthMismatch {
                    expected: total,
                    actual: received,
                });
            }
        }
        if verify {
            self.verify_contributions()?;
        }

        let values: Vec<Fr> = self.contributions.values().copied().collect();
        let key_share = self.dkg.create_private_key_share(self.index, &values)?;

        let public_contributions: Vec<G2Affine> = self
            .commitments
            .values()
            .filter_map(|commitments| commitments.first().copied())
            .collect();
        let public_key = self.dkg.common_public_key(&public_contributions)?;

        info!(verified = verify, "DKG complete");
        Ok(DkgOutput {
            key_share,
            public_key,
        })
    }
}
