//! Polynomial secret sharing for distributed key generation

use crate::curve::{self, Fr, G2Affine, G2Projective};
use crate::keys::{PrivateKeyShare, PublicKey};
use crate::types::{ParticipantIndex, ThresholdParams};
use crate::{Error, Result};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{One, Zero};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Secret polynomial `a_0 + a_1 x + … + a_{t-1} x^{t-1}` of one participant.
///
/// `a_0` is the participant's contribution to the shared secret. Only
/// evaluations leave the owner; the coefficients are wiped on drop.
#[derive(Clone)]
pub struct Polynomial {
    coefficients: Vec<Fr>,
}

impl Polynomial {
    /// Draw `len` uniformly random coefficients
    pub fn random<R: RngCore + CryptoRng>(len: usize, rng: &mut R) -> Self {
        Self {
            coefficients: (0..len).map(|_| curve::random_scalar(rng)).collect(),
        }
    }

    pub fn coefficients(&self) -> &[Fr] {
        &self.coefficients
    }

    /// Number of coefficients (`t`)
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// The secret term `a_0`
    pub fn free_coefficient(&self) -> Fr {
        self.coefficients.first().copied().unwrap_or_else(Fr::zero)
    }

    /// Horner evaluation at `x`
    pub fn evaluate(&self, x: Fr) -> Fr {
        self.coefficients
            .iter()
            .rev()
            .fold(Fr::zero(), |acc, coeff| acc * x + coeff)
    }
}

impl From<Vec<Fr>> for Polynomial {
    fn from(coefficients: Vec<Fr>) -> Self {
        Self { coefficients }
    }
}

impl Drop for Polynomial {
    fn drop(&mut self) {
        self.coefficients.zeroize();
    }
}

/// DKG engine for fixed threshold parameters.
///
/// Contributions are not checked against the sender's commitments unless
/// [`Dkg::verify_contribution`] is called explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Dkg {
    params: ThresholdParams,
}

impl Dkg {
    pub fn new(params: ThresholdParams) -> Self {
        curve::init();
        Self { params }
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    /// Generate a random degree `t-1` polynomial from the OS entropy source
    pub fn generate_polynomial(&self) -> Polynomial {
        self.generate_polynomial_with_rng(&mut OsRng)
    }

    /// Generate a random degree `t-1` polynomial from `rng`
    #[instrument(skip(self, rng), fields(t = self.params.required()))]
    pub fn generate_polynomial_with_rng<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Polynomial {
        debug!("Generating secret polynomial");
        Polynomial::random(self.params.required(), rng)
    }

    fn check_polynomial(&self, polynomial: &Polynomial) -> Result<()> {
        if polynomial.len() != self.params.required() {
            return Err(Error::LengthMismatch {
                expected: self.params.required(),
                actual: polynomial.len(),
            });
        }
        Ok(())
    }

    /// Evaluate `polynomial` at `x = 1..=n`, one value per recipient.
    ///
    /// Entry `j - 1` is addressed to participant `j`.
    #[instrument(skip_all, fields(n = self.params.total()))]
    pub fn secret_key_contribution(&self, polynomial: &Polynomial) -> Result<Vec<Fr>> {
        self.check_polynomial(polynomial)?;

        #[cfg(feature = "parallel")]
        let evaluations = self
            .params
            .indices()
            .into_par_iter()
            .map(|index| polynomial.evaluate(Fr::from(index as u64)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let evaluations = self
            .params
            .indices()
            .map(|index| polynomial.evaluate(Fr::from(index as u64)))
            .collect();

        Ok(evaluations)
    }

    /// Sum the `n` values received by one participant into its secret share
    #[instrument(skip_all, fields(n = self.params.total()))]
    pub fn secret_key_share_create(&self, received: &[Fr]) -> Result<Fr> {
        if received.len() != self.params.total() {
            return Err(Error::LengthMismatch {
                expected: self.params.total(),
                actual: received.len(),
            });
        }

        let share = received.iter().fold(Fr::zero(), |acc, value| acc + value);
        if share.is_zero() {
            warn!("Contributions sum to zero");
            return Err(Error::ZeroKey);
        }
        Ok(share)
    }

    /// [`Dkg::secret_key_share_create`], wrapped as the share of `index`
    pub fn create_private_key_share(
        &self,
        index: ParticipantIndex,
        received: &[Fr],
    ) -> Result<PrivateKeyShare> {
        let mut share = self.secret_key_share_create(received)?;
        let key_share = PrivateKeyShare::new(share, index, self.params);
        share.zeroize();

        info!(index, "Created private key share");
        key_share
    }

    /// `a_0 · g2`, this polynomial's part of the common public key
    pub fn public_key_contribution(&self, polynomial: &Polynomial) -> G2Affine {
        curve::g2_mul_generator(&polynomial.free_coefficient()).into_affine()
    }

    /// Sum every participant's `a_0 · g2` into the common public key
    pub fn common_public_key(&self, contributions: &[G2Affine]) -> Result<PublicKey> {
        if contributions.len() != self.params.total() {
            return Err(Error::LengthMismatch {
                expected: self.params.total(),
                actual: contributions.len(),
            });
        }

        let point = contributions
            .iter()
            .fold(G2Projective::zero(), |acc, contribution| acc + contribution);
        PublicKey::from_point(point.into_affine(), self.params)
    }

    /// Feldman commitments `a_k · g2` for every coefficient
    pub fn commitments(&self, polynomial: &Polynomial) -> Vec<G2Affine> {
        let points: Vec<G2Projective> = polynomial
            .coefficients()
            .iter()
            .map(curve::g2_mul_generator)
            .collect();
        G2Projective::normalize_batch(&points)
    }

    /// Check `value · g2 == Σ_k commitments[k] · to^k`
    pub fn verify_contribution(
        &self,
        from: ParticipantIndex,
        commitments: &[G2Affine],
        to: ParticipantIndex,
        value: &Fr,
    ) -> Result<()> {
        self.params.check_index(from)?;
        self.params.check_index(to)?;
        if commitments.len() != self.params.required() {
            return Err(Error::LengthMismatch {
                expected: self.params.required(),
                actual: commitments.len(),
            });
        }

        let x = Fr::from(to as u64);
        let mut power = Fr::one();
        let mut expected = G2Projective::zero();
        for commitment in commitments {
            expected += commitment.into_group() * power;
            power *= x;
        }

        if expected != curve::g2_mul_generator(value) {
            warn!(from, to, "Contribution does not match commitments");
            return Err(Error::ContributionMismatch { from, to });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;
    use crate::lagrange::{lagrange_coeffs, recover};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn dkg(t: usize, n: usize) -> Dkg {
        Dkg::new(ThresholdParams::new(t, n).unwrap())
    }

    #[test]
    fn test_generate_polynomial() {
        let dkg = dkg(3, 5);
        let a = dkg.generate_polynomial();
        let b = dkg.generate_polynomial();
        assert_eq!(a.len(), 3);
        assert_ne!(a.coefficients(), b.coefficients());
    }

    #[test]
    fn test_contribution_evaluates_at_indices() {
        let dkg = dkg(2, 4);
        // 3 + 2x
        let poly = Polynomial::from(vec![Fr::from(3u64), Fr::from(2u64)]);
        let evaluations = dkg.secret_key_contribution(&poly).unwrap();
        let expected: Vec<Fr> = [5u64, 7, 9, 11].iter().map(|&v| Fr::from(v)).collect();
        assert_eq!(evaluations, expected);
    }

    #[test]
    fn test_contribution_rejects_wrong_degree() {
        let dkg = dkg(3, 5);
        let poly = Polynomial::from(vec![Fr::one(), Fr::one()]);
        assert_eq!(
            dkg.secret_key_contribution(&poly),
            Err(Error::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_zero_sum_share_rejected() {
        // two constant polynomials that cancel
        let dkg = dkg(1, 2);
        let first = dkg
            .secret_key_contribution(&Polynomial::from(vec![Fr::from(9u64)]))
            .unwrap();
        let second = dkg
            .secret_key_contribution(&Polynomial::from(vec![-Fr::from(9u64)]))
            .unwrap();

        let received = vec![first[0], second[0]];
        assert_eq!(dkg.secret_key_share_create(&received), Err(Error::ZeroKey));
        assert_eq!(
            dkg.create_private_key_share(1, &received).unwrap_err(),
            Error::ZeroKey
        );
    }

    #[test]
    fn test_share_create_needs_all_contributions() {
        let dkg = dkg(2, 3);
        assert!(matches!(
            dkg.secret_key_share_create(&[Fr::one(), Fr::one()]),
            Err(Error::LengthMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_shares_interpolate_to_sum_of_secrets() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let dkg = dkg(3, 5);
        let params = dkg.params();

        let polys: Vec<Polynomial> = (0..5)
            .map(|_| dkg.generate_polynomial_with_rng(&mut rng))
            .collect();
        let contributions: Vec<Vec<Fr>> = polys
            .iter()
            .map(|p| dkg.secret_key_contribution(p).unwrap())
            .collect();

        let shares: Vec<Fr> = (0..5)
            .map(|j| {
                let column: Vec<Fr> = contributions.iter().map(|c| c[j]).collect();
                dkg.secret_key_share_create(&column).unwrap()
            })
            .collect();

        let secret = polys
            .iter()
            .fold(Fr::zero(), |acc, p| acc + p.free_coefficient());
        let coeffs = lagrange_coeffs(&params, &[2, 3, 5]).unwrap();
        let recovered = recover(&coeffs, &[shares[1], shares[2], shares[4]]).unwrap();
        assert_eq!(recovered, secret);

        let public_contributions: Vec<G2Affine> =
            polys.iter().map(|p| dkg.public_key_contribution(p)).collect();
        let public_key = dkg.common_public_key(&public_contributions).unwrap();
        let expected = PrivateKey::from_scalar(secret, params).unwrap().public_key();
        assert_eq!(public_key, expected);
    }

    #[test]
    fn test_feldman_verification() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        let dkg = dkg(3, 4);
        let poly = dkg.generate_polynomial_with_rng(&mut rng);
        let commitments = dkg.commitments(&poly);
        let evaluations = dkg.secret_key_contribution(&poly).unwrap();

        assert_eq!(commitments[0], dkg.public_key_contribution(&poly));
        for (j, value) in evaluations.iter().enumerate() {
            assert!(dkg.verify_contribution(1, &commitments, j + 1, value).is_ok());
        }

        let tampered = evaluations[2] + Fr::one();
        assert_eq!(
            dkg.verify_contribution(1, &commitments, 3, &tampered),
            Err(Error::ContributionMismatch { from: 1, to: 3 })
        );
        // right value, wrong recipient
        assert!(dkg
            .verify_contribution(1, &commitments, 4, &evaluations[2])
            .is_err());
    }
}
