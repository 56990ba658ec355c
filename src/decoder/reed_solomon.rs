//! Reed-Solomon error correction over GF(256), using the extended
//! Euclidean algorithm to find the error locator and evaluator
//! polynomials, then Chien search and Forney's formula.

use crate::error::DecodeError;
use crate::gf256::Gf256;

/// Polynomial over GF(256), coefficient of x^i at index i.
#[derive(Clone, Debug)]
struct Poly(Vec<u8>);

impl Poly {
    fn zero() -> Self {
        Poly(vec![0])
    }

    fn one() -> Self {
        Poly(vec![1])
    }

    /// coefficient * x^degree
    fn monomial(degree: usize, coefficient: u8) -> Self {
        if coefficient == 0 {
            return Self::zero();
        }
        let mut coeffs = vec![0u8; degree + 1];
        coeffs[degree] = coefficient;
        Poly(coeffs)
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    fn degree(&self) -> usize {
        self.0.iter().rposition(|&c| c != 0).unwrap_or(0)
    }

    fn coefficient(&self, degree: usize) -> u8 {
        self.0.get(degree).copied().unwrap_or(0)
    }

    fn evaluate_at(&self, a: u8) -> u8 {
        if a == 0 {
            return self.coefficient(0);
        }
        // Horner from the highest coefficient down
        let mut result = 0u8;
        for &coeff in self.0.iter().rev() {
            result = Gf256::mul(result, a) ^ coeff;
        }
        result
    }

    /// Addition and subtraction coincide in GF(256).
    fn add(&self, other: &Poly) -> Poly {
        let mut coeffs = vec![0u8; self.0.len().max(other.0.len())];
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = self.coefficient(i) ^ other.coefficient(i);
        }
        Poly(coeffs)
    }

    fn multiply(&self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut coeffs = vec![0u8; self.degree() + other.degree() + 1];
        for (i, &a) in self.0.iter().enumerate() {
            for (j, &b) in other.0.iter().enumerate() {
                coeffs[i + j] ^= Gf256::mul(a, b);
            }
        }
        Poly(coeffs)
    }

    fn multiply_scalar(&self, scalar: u8) -> Poly {
        Poly(self.0.iter().map(|&c| Gf256::mul(c, scalar)).collect())
    }

    /// self * coefficient * x^degree
    fn multiply_by_monomial(&self, degree: usize, coefficient: u8) -> Poly {
        if coefficient == 0 {
            return Self::zero();
        }
        let mut coeffs = vec![0u8; degree];
        coeffs.extend(self.0.iter().map(|&c| Gf256::mul(c, coefficient)));
        Poly(coeffs)
    }
}

/// Correct up to floor(ecc_len / 2) byte errors in place. Returns the
/// number of errors corrected, or a checksum failure.
pub fn correct_errors(codeword: &mut [u8], ecc_len: usize) -> Result<usize, DecodeError> {
    let two_s = ecc_len;
    let poly = Poly(codeword.iter().rev().copied().collect());

    // Syndromes: evaluate the received polynomial at alpha^0..alpha^(2s-1)
    let mut syndromes = vec![0u8; two_s];
    let mut no_error = true;
    for (i, syndrome) in syndromes.iter_mut().enumerate() {
        *syndrome = poly.evaluate_at(Gf256::exp(i));
        no_error &= *syndrome == 0;
    }
    if no_error {
        return Ok(0);
    }

    let syndrome_poly = Poly(syndromes);
    let (sigma, omega) = run_euclidean(&Poly::monomial(two_s, 1), &syndrome_poly, two_s)?;
    let locations = find_error_locations(&sigma)?;
    let magnitudes = find_error_magnitudes(&omega, &locations);

    for (&location, &magnitude) in locations.iter().zip(&magnitudes) {
        let log = Gf256::log(location);
        if log >= codeword.len() {
            return Err(DecodeError::Checksum);
        }
        let position = codeword.len() - 1 - log;
        codeword[position] ^= magnitude;
    }
    Ok(locations.len())
}

/// Extended Euclidean algorithm on (x^2s, syndromes), stopping when the
/// remainder degree drops below s. Yields the error locator sigma and
/// error evaluator omega.
fn run_euclidean(a: &Poly, b: &Poly, two_s: usize) -> Result<(Poly, Poly), DecodeError> {
    let mut r_last = a.clone();
    let mut r = b.clone();
    let mut t_last = Poly::zero();
    let mut t = Poly::one();

    // Iterate until deg(r) < floor(2s / 2), the errors-only bound
    while r.degree() >= two_s / 2 {
        let r_last_last = r_last;
        let t_last_last = t_last;
        r_last = r;
        t_last = t;

        if r_last.is_zero() {
            // Euclid's algorithm terminated early
            return Err(DecodeError::Checksum);
        }

        r = r_last_last;
        let mut q = Poly::zero();
        let denominator_inverse = Gf256::inverse(r_last.coefficient(r_last.degree()));
        while r.degree() >= r_last.degree() && !r.is_zero() {
            let degree_diff = r.degree() - r_last.degree();
            let scale = Gf256::mul(r.coefficient(r.degree()), denominator_inverse);
            q = q.add(&Poly::monomial(degree_diff, scale));
            r = r.add(&r_last.multiply_by_monomial(degree_diff, scale));
        }
        t = q.multiply(&t_last).add(&t_last_last);

        if r.degree() >= r_last.degree() {
            return Err(DecodeError::Checksum);
        }
    }

    let sigma_tilde_at_zero = t.coefficient(0);
    if sigma_tilde_at_zero == 0 {
        return Err(DecodeError::Checksum);
    }
    let inverse = Gf256::inverse(sigma_tilde_at_zero);
    Ok((t.multiply_scalar(inverse), r.multiply_scalar(inverse)))
}

/// Chien search over all field elements for the roots of sigma.
fn find_error_locations(sigma: &Poly) -> Result<Vec<u8>, DecodeError> {
    let num_errors = sigma.degree();
    if num_errors == 1 {
        return Ok(vec![sigma.coefficient(1)]);
    }
    let mut locations = Vec::with_capacity(num_errors);
    for i in 1..=255u8 {
        if sigma.evaluate_at(i) == 0 {
            locations.push(Gf256::inverse(i));
            if locations.len() == num_errors {
                break;
            }
        }
    }
    if locations.len() != num_errors {
        return Err(DecodeError::Checksum);
    }
    Ok(locations)
}

/// Forney's formula: magnitude_i = omega(Xi^-1) / prod_{j!=i} (1 + Xj * Xi^-1).
fn find_error_magnitudes(omega: &Poly, locations: &[u8]) -> Vec<u8> {
    locations
        .iter()
        .map(|&xi| {
            let xi_inverse = Gf256::inverse(xi);
            let mut denominator = 1u8;
            for &xj in locations {
                if xj != xi {
                    denominator = Gf256::mul(denominator, 1 ^ Gf256::mul(xj, xi_inverse));
                }
            }
            Gf256::mul(omega.evaluate_at(xi_inverse), Gf256::inverse(denominator))
        })
        .collect()
}
