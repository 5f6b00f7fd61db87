//! Collection of signature shares and one-shot recovery of the signature

use super::{SigShare, Signature};
use crate::curve::G1Projective;
use crate::lagrange::{lagrange_coeffs, recover};
use crate::types::{ParticipantIndex, ThresholdParams};
use crate::{Error, Result};
use ark_ec::{AffineRepr, CurveGroup};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Accumulates signature shares keyed by signer index until the threshold
/// is reached, then recovers the group signature exactly once.
///
/// States: collecting, then merged. Nothing leaves the merged state; adding
/// or merging again is an error. A failed call leaves the set unchanged.
#[derive(Debug, Clone)]
pub struct SigShareSet {
    params: ThresholdParams,
    shares: BTreeMap<ParticipantIndex, SigShare>,
    merged: bool,
}

impl SigShareSet {
    pub fn new(params: ThresholdParams) -> Self {
        crate::curve::init();
        Self {
            params,
            shares: BTreeMap::new(),
            merged: false,
        }
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Add a signer's share.
    ///
    /// Accepts `SigShare` or `Option<SigShare>`; `None` stands for an absent
    /// share. A second share for an already present index is rejected, never
    /// overwritten, and so is a share made under other threshold parameters.
    pub fn add_sig_share(&mut self, share: impl Into<Option<SigShare>>) -> Result<()> {
        if self.merged {
            return Err(Error::AlreadyMerged);
        }
        let share = share.into().ok_or(Error::MissingShare)?;

        let index = share.index();
        self.params.check_index(index)?;
        if share.params() != self.params {
            warn!(index, "Rejected signature share for a different group");
            return Err(Error::InvalidThreshold {
                required: share.params().required(),
                total: share.params().total(),
            });
        }
        if self.shares.contains_key(&index) {
            warn!(index, "Rejected duplicate signature share");
            return Err(Error::DuplicateIndex(index));
        }

        self.shares.insert(index, share);
        debug!(
            index,
            collected = self.shares.len(),
            required = self.params.required(),
            "Accepted signature share"
        );
        Ok(())
    }

    /// Whether at least `t` distinct shares are present
    pub fn is_enough(&self) -> bool {
        self.shares.len() >= self.params.required()
    }

    pub fn total_sig_shares_count(&self) -> usize {
        self.shares.len()
    }

    pub fn is_merged(&self) -> bool {
        self.merged
    }

    /// Look up the share submitted by `index`, `Ok(None)` if there is none yet
    pub fn get_sig_share_by_index(&self, index: ParticipantIndex) -> Result<Option<&SigShare>> {
        self.params.check_index(index)?;
        Ok(self.shares.get(&index))
    }

    /// Recover the group signature from every collected share.
    ///
    /// The result carries the hint of the lowest-indexed share.
    #[instrument(skip(self), fields(t = self.params.required(), n = self.params.total()))]
    pub fn merge(&mut self) -> Result<Signature> {
        if self.merged {
            return Err(Error::AlreadyMerged);
        }
        if !self.is_enough() {
            return Err(Error::ThresholdNotMet {
                required: self.params.required(),
                actual: self.shares.len(),
            });
        }

        let (indices, points): (Vec<ParticipantIndex>, Vec<G1Projective>) = self
            .shares
            .iter()
            .map(|(index, share)| (*index, share.point().into_group()))
            .unzip();
        debug!(?indices, "Merging signature shares");

        let coeffs = lagrange_coeffs(&self.params, &indices)?;
        let point = recover(&coeffs, &points)?.into_affine();
        let hint = self
            .shares
            .values()
            .next()
            .and_then(|share| share.hint().map(str::to_string));

        self.merged = true;
        info!(signers = indices.len(), "Recovered group signature");

        Ok(Signature::new(point, hint, self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{hash_to_g1, random_scalar, Fr};
    use crate::keys::{PrivateKey, PrivateKeyShare};
    use ark_ff::Zero;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    const MESSAGE: &[u8] = b"threshold message";

    fn setup(t: usize, n: usize, seed: u64) -> (PrivateKey, Vec<PrivateKeyShare>) {
        let params = ThresholdParams::new(t, n).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let poly: Vec<Fr> = (0..t).map(|_| random_scalar(&mut rng)).collect();
        let shares = params
            .indices()
            .map(|i| {
                let x = Fr::from(i as u64);
                let value = poly.iter().rev().fold(Fr::zero(), |acc, c| acc * x + c);
                PrivateKeyShare::new(value, i, params).unwrap()
            })
            .collect();
        (PrivateKey::from_scalar(poly[0], params).unwrap(), shares)
    }

    fn collect(
        shares: &[PrivateKeyShare],
        which: &[usize],
        params: ThresholdParams,
    ) -> SigShareSet {
        let mut set = SigShareSet::new(params);
        for &i in which {
            set.add_sig_share(shares[i - 1].sign(MESSAGE).unwrap())
                .unwrap();
        }
        set
    }

    #[test]
    fn test_merge_verifies_and_matches_direct_signature() {
        let (key, shares) = setup(3, 5, 21);
        let params = key.params();

        let mut set = collect(&shares, &[1, 2, 3], params);
        assert!(set.is_enough());
        let signature = set.merge().unwrap();

        assert!(key.public_key().verify_sig(MESSAGE, &signature).unwrap());
        assert_eq!(signature, key.sign(MESSAGE).unwrap());
    }

    #[test]
    fn test_merge_is_subset_independent() {
        let (_, shares) = setup(3, 5, 22);
        let params = shares[0].params();

        let a = collect(&shares, &[1, 2, 3], params).merge().unwrap();
        let b = collect(&shares, &[2, 4, 5], params).merge().unwrap();
        let c = collect(&shares, &[5, 3, 1, 4], params).merge().unwrap();

        assert_eq!(a.point(), b.point());
        assert_eq!(a.point(), c.point());
    }

    #[test]
    fn test_duplicate_rejected() {
        let (_, shares) = setup(2, 3, 23);
        let mut set = SigShareSet::new(shares[0].params());

        set.add_sig_share(shares[0].sign(MESSAGE).unwrap()).unwrap();
        assert_eq!(
            set.add_sig_share(shares[0].sign(b"another").unwrap()),
            Err(Error::DuplicateIndex(1))
        );
        assert_eq!(set.total_sig_shares_count(), 1);
        assert_eq!(
            set.get_sig_share_by_index(1).unwrap().unwrap(),
            &shares[0].sign(MESSAGE).unwrap()
        );
    }

    #[test]
    fn test_missing_share_rejected() {
        let params = ThresholdParams::new(1, 2).unwrap();
        let mut set = SigShareSet::new(params);
        assert_eq!(set.add_sig_share(None::<SigShare>), Err(Error::MissingShare));
        assert_eq!(set.total_sig_shares_count(), 0);
    }

    #[test]
    fn test_foreign_index_rejected() {
        let (_, shares) = setup(2, 5, 24);
        // a collector for a smaller group than the signer belongs to
        let mut set = SigShareSet::new(ThresholdParams::new(2, 3).unwrap());
        assert_eq!(
            set.add_sig_share(shares[4].sign(MESSAGE).unwrap()),
            Err(Error::IndexOutOfRange { index: 5, total: 3 })
        );
    }

    #[test]
    fn test_foreign_params_rejected() {
        let (_, shares) = setup(2, 3, 27);
        // same n, different t
        let mut set = SigShareSet::new(ThresholdParams::new(3, 3).unwrap());
        assert_eq!(
            set.add_sig_share(shares[0].sign(MESSAGE).unwrap()),
            Err(Error::InvalidThreshold {
                required: 2,
                total: 3
            })
        );
        assert_eq!(set.total_sig_shares_count(), 0);
    }

    #[test]
    fn test_merge_is_single_use() {
        let (_, shares) = setup(2, 3, 25);
        let params = shares[0].params();
        let mut set = collect(&shares, &[1, 3], params);

        let signature = set.merge().unwrap();
        assert!(set.is_merged());
        assert_eq!(set.merge(), Err(Error::AlreadyMerged));
        assert_eq!(
            set.add_sig_share(shares[1].sign(MESSAGE).unwrap()),
            Err(Error::AlreadyMerged)
        );
        assert_eq!(set.total_sig_shares_count(), 2);

        // the produced signature is untouched by the failed calls
        let again = collect(&shares, &[1, 3], params).merge().unwrap();
        assert_eq!(signature, again);
    }

    #[test]
    fn test_merge_below_threshold() {
        let (_, shares) = setup(3, 5, 26);
        let mut set = collect(&shares, &[1, 2], shares[0].params());
        assert!(!set.is_enough());
        assert_eq!(
            set.merge(),
            Err(Error::ThresholdNotMet {
                required: 3,
                actual: 2
            })
        );
        assert!(!set.is_merged());

        // keep collecting after the failure
        set.add_sig_share(shares[2].sign(MESSAGE).unwrap()).unwrap();
        assert!(set.merge().is_ok());
    }

    #[test]
    fn test_get_sig_share_bounds() {
        for n in 1..6 {
            let set = SigShareSet::new(ThresholdParams::new(1, n).unwrap());
            assert_eq!(
                set.get_sig_share_by_index(0),
                Err(Error::IndexOutOfRange { index: 0, total: n })
            );
            assert_eq!(
                set.get_sig_share_by_index(n + 1),
                Err(Error::IndexOutOfRange {
                    index: n + 1,
                    total: n
                })
            );
            for k in 1..=n {
                assert_eq!(set.get_sig_share_by_index(k), Ok(None));
            }
        }
    }

    #[test]
    fn test_hint_from_lowest_index() {
        let params = ThresholdParams::new(2, 3).unwrap();
        let (point, _) = hash_to_g1(MESSAGE).unwrap();
        let mut set = SigShareSet::new(params);
        set.add_sig_share(SigShare::new(point, 3, Some("third".into()), params).unwrap())
            .unwrap();
        set.add_sig_share(SigShare::new(point, 2, Some("second".into()), params).unwrap())
            .unwrap();

        assert_eq!(set.merge().unwrap().hint(), Some("second"));
    }
}
