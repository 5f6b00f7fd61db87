//! Lagrange interpolation at zero over the scalar field

use crate::curve::Fr;
use crate::types::{ParticipantIndex, ThresholdParams};
use crate::{Error, Result};
use ark_ff::{Field, One, Zero};
use std::ops::{Add, Mul};

/// Compute the Lagrange basis coefficients at `x = 0` for the given indices.
///
/// For each `i` in `indices`, `λ_i = Π_{j≠i} (0 - x_j) / (x_i - x_j)` with
/// `x_k = k`, so that `Σ λ_i · f(i) = f(0)` for any polynomial of degree
/// below `indices.len()`.
///
/// Indices must be distinct and in `[1, n]`. A repeated index makes a
/// denominator vanish and is reported as [`Error::DuplicateIndex`].
/// Enforcing the threshold is left to the caller.
pub fn lagrange_coeffs(params: &ThresholdParams, indices: &[ParticipantIndex]) -> Result<Vec<Fr>> {
    for &index in indices {
        params.check_index(index)?;
    }

    let xs: Vec<Fr> = indices.iter().map(|&index| Fr::from(index as u64)).collect();

    xs.iter()
        .enumerate()
        .map(|(i, x_i)| {
            let mut numerator = Fr::one();
            let mut denominator = Fr::one();
            for (j, x_j) in xs.iter().enumerate() {
                if i == j {
                    continue;
                }
                numerator *= -*x_j;
                denominator *= *x_i - x_j;
            }
            let inverse = denominator
                .inverse()
                .ok_or(Error::DuplicateIndex(indices[i]))?;
            Ok(numerator * inverse)
        })
        .collect()
}

/// Weighted sum `Σ λ_i · v_i`, over scalars or group elements
pub fn recover<T>(coeffs: &[Fr], values: &[T]) -> Result<T>
where
    T: Copy + Zero + Add<Output = T> + Mul<Fr, Output = T>,
{
    if coeffs.len() != values.len() {
        return Err(Error::LengthMismatch {
            expected: coeffs.len(),
            actual: values.len(),
        });
    }

    Ok(coeffs
        .iter()
        .zip(values)
        .fold(T::zero(), |acc, (coeff, value)| acc + *value * *coeff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{g2_mul_generator, random_scalar, G2Projective};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn evaluate(coeffs: &[Fr], x: u64) -> Fr {
        let x = Fr::from(x);
        coeffs.iter().rev().fold(Fr::zero(), |acc, c| acc * x + c)
    }

    fn subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
        (0u32..(1 << n))
            .filter(|mask| mask.count_ones() as usize == k)
            .map(|mask| (1..=n).filter(|i| mask & (1 << (i - 1)) != 0).collect())
            .collect()
    }

    #[test]
    fn test_reconstruction_is_subset_independent() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for n in 1..7 {
            for t in 1..=n {
                let params = ThresholdParams::new(t, n).unwrap();
                let poly: Vec<Fr> = (0..t).map(|_| random_scalar(&mut rng)).collect();

                for k in t..=n {
                    for subset in subsets(n, k) {
                        let coeffs = lagrange_coeffs(&params, &subset).unwrap();
                        let values: Vec<Fr> =
                            subset.iter().map(|&i| evaluate(&poly, i as u64)).collect();
                        assert_eq!(recover(&coeffs, &values).unwrap(), poly[0]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_reconstruction_in_exponent() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let params = ThresholdParams::new(3, 5).unwrap();
        let poly: Vec<Fr> = (0..3).map(|_| random_scalar(&mut rng)).collect();
        let expected = g2_mul_generator(&poly[0]);

        for subset in [vec![1, 2, 3], vec![2, 4, 5], vec![5, 1, 3]] {
            let coeffs = lagrange_coeffs(&params, &subset).unwrap();
            let points: Vec<G2Projective> = subset
                .iter()
                .map(|&i| g2_mul_generator(&evaluate(&poly, i as u64)))
                .collect();
            assert_eq!(recover(&coeffs, &points).unwrap(), expected);
        }
    }

    #[test]
    fn test_known_coefficients() {
        // indices {1, 2}: λ_1 = 2, λ_2 = -1
        let params = ThresholdParams::new(2, 3).unwrap();
        let coeffs = lagrange_coeffs(&params, &[1, 2]).unwrap();
        assert_eq!(coeffs, vec![Fr::from(2u64), -Fr::one()]);

        // a single index reconstructs to itself
        let coeffs = lagrange_coeffs(&params, &[3]).unwrap();
        assert_eq!(coeffs, vec![Fr::one()]);
    }

    #[test]
    fn test_duplicate_index_fails() {
        let params = ThresholdParams::new(2, 5).unwrap();
        assert_eq!(
            lagrange_coeffs(&params, &[1, 3, 3]),
            Err(Error::DuplicateIndex(3))
        );
    }

    #[test]
    fn test_index_out_of_range_fails() {
        let params = ThresholdParams::new(2, 5).unwrap();
        assert_eq!(
            lagrange_coeffs(&params, &[0, 1]),
            Err(Error::IndexOutOfRange { index: 0, total: 5 })
        );
        assert_eq!(
            lagrange_coeffs(&params, &[1, 6]),
            Err(Error::IndexOutOfRange { index: 6, total: 5 })
        );
    }

    #[test]
    fn test_recover_length_mismatch() {
        let coeffs = vec![Fr::one(), Fr::one()];
        assert_eq!(
            recover(&coeffs, &[Fr::one()]),
            Err(Error::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
