//! Reed-Solomon coding over GF(2^8) with generator base b = 0.
//!
//! The encoder side divides the data polynomial by the degree-t generator
//! and appends the remainder; the decoder side recovers up to
//! floor(t/2) codeword errors through syndromes, the extended Euclidean
//! key equation, a Chien search and Forney's magnitudes.

use crate::error::QrError;
use crate::gf256;
use crate::poly::Poly;

// (x + root); subtraction and addition coincide in GF(2^8).
fn linear_factor(root: u8) -> Poly {
    Poly::monomial(1, 1).add_or_subtract(&Poly::monomial(0, root))
}

/// Builds the generator polynomial of the given degree,
/// g(x) = (x - 1)(x - alpha)(x - alpha^2) ... (x - alpha^(degree-1)).
pub fn generator(degree: usize) -> Poly {
    assert!((1..=255).contains(&degree), "Degree out of range");
    let mut g = Poly::one();
    for i in 0..degree {
        g = g.multiply(&linear_factor(gf256::exp(i as i32)));
    }
    g
}

/// Computes the `degree` error-correction codewords for a data block.
///
/// The returned block `data || ecc`, read as a polynomial, evaluates to
/// zero at alpha^0 through alpha^(degree-1).
pub fn compute_ecc(data: &[u8], degree: usize) -> Result<Vec<u8>, QrError> {
    let gen = generator(degree);
    let mut padded = data.to_vec();
    padded.resize(data.len() + degree, 0);
    let remainder = Poly::new(&padded)?.rem(&gen)?;

    // Left-pad the remainder coefficients out to `degree` bytes.
    let mut ecc = vec![0u8; degree];
    if !remainder.is_zero() {
        let len = remainder.degree() + 1;
        for (i, slot) in ecc[degree - len..].iter_mut().enumerate() {
            *slot = remainder.coefficient(len - 1 - i);
        }
    }
    Ok(ecc)
}

/// Corrects codeword errors in place given `ecc_len` trailing
/// error-correction codewords. Returns the number of corrected positions.
///
/// Fails with `Uncorrectable` when the Euclidean step stalls, the number
/// of located errors disagrees with the locator degree, or a located
/// position falls outside the codeword. The caller treats that as an
/// unrecoverable block.
pub fn correct_errors(codeword: &mut [u8], ecc_len: usize) -> Result<usize, QrError> {
    debug_assert!(ecc_len > 0 && codeword.len() > ecc_len);
    let received = Poly::new(codeword)?;

    // Syndromes S_i = c(alpha^i); all zero means an intact codeword.
    let mut syndromes = vec![0u8; ecc_len];
    let mut has_error = false;
    for i in 0..ecc_len {
        let s = received.eval(gf256::exp(i as i32));
        syndromes[ecc_len - 1 - i] = s;
        has_error |= s != 0;
    }
    if !has_error {
        return Ok(0);
    }

    let syndrome_poly = Poly::new(&syndromes)?;
    let (sigma, omega) = run_euclidean(&Poly::monomial(ecc_len, 1), &syndrome_poly, ecc_len)
        .ok_or(QrError::Uncorrectable)?;
    let locations = find_error_locations(&sigma).ok_or(QrError::Uncorrectable)?;
    let magnitudes = find_error_magnitudes(&omega, &locations).ok_or(QrError::Uncorrectable)?;

    for (&location, &magnitude) in locations.iter().zip(&magnitudes) {
        let exponent = usize::from(gf256::log(location).map_err(|_| QrError::Uncorrectable)?);
        let position =
            codeword.len().checked_sub(1 + exponent).ok_or(QrError::Uncorrectable)?;
        codeword[position] ^= magnitude;
    }
    Ok(locations.len())
}

// Extended Euclidean on x^t and S(x), stopping once the remainder degree
// drops below t/2; yields (sigma, omega) normalised so sigma(0) = 1.
fn run_euclidean(a: &Poly, b: &Poly, t: usize) -> Option<(Poly, Poly)> {
    let (mut r_last, mut r) = if a.degree() < b.degree() {
        (b.clone(), a.clone())
    } else {
        (a.clone(), b.clone())
    };
    let mut t_last = Poly::zero();
    let mut t_current = Poly::one();

    while r.degree() >= t / 2 {
        let r_last_last = r_last;
        let t_last_last = t_last;
        r_last = r;
        t_last = t_current;

        if r_last.is_zero() {
            return None; // the key equation has no solution
        }
        r = r_last_last;
        let mut q = Poly::zero();
        let dlt_inverse = gf256::inv(r_last.coefficient(r_last.degree())).ok()?;
        while r.degree() >= r_last.degree() && !r.is_zero() {
            let degree_diff = r.degree() - r_last.degree();
            let scale = gf256::mul(r.coefficient(r.degree()), dlt_inverse);
            q = q.add_or_subtract(&Poly::monomial(degree_diff, scale));
            r = r.add_or_subtract(&r_last.multiply_by_monomial(degree_diff, scale));
        }
        t_current = q.multiply(&t_last).add_or_subtract(&t_last_last);

        if r.degree() >= r_last.degree() {
            return None; // division made no progress
        }
    }

    let sigma_at_zero = t_current.coefficient(0);
    if sigma_at_zero == 0 {
        return None;
    }
    let inverse = gf256::inv(sigma_at_zero).ok()?;
    Some((t_current.multiply_scalar(inverse), r.multiply_scalar(inverse)))
}

// Chien search: the error positions are the inverses of the roots of the
// locator polynomial.
fn find_error_locations(sigma: &Poly) -> Option<Vec<u8>> {
    let num_errors = sigma.degree();
    if num_errors == 0 {
        return None; // non-zero syndromes but a constant locator
    }
    if num_errors == 1 {
        return Some(vec![sigma.coefficient(1)]);
    }
    let mut locations = Vec::with_capacity(num_errors);
    for i in 1..=255u16 {
        if locations.len() == num_errors {
            break;
        }
        if sigma.eval(i as u8) == 0 {
            locations.push(gf256::inv(i as u8).ok()?);
        }
    }
    if locations.len() != num_errors {
        return None;
    }
    Some(locations)
}

// Forney: magnitude at X_i is omega(X_i^-1) / prod_{j != i} (1 + X_j X_i^-1).
// With generator base 0 no further X_i^-1 factor applies.
fn find_error_magnitudes(omega: &Poly, locations: &[u8]) -> Option<Vec<u8>> {
    let mut magnitudes = Vec::with_capacity(locations.len());
    for (i, &location) in locations.iter().enumerate() {
        let xi_inverse = gf256::inv(location).ok()?;
        let mut denominator = 1u8;
        for (j, &other) in locations.iter().enumerate() {
            if i != j {
                denominator =
                    gf256::mul(denominator, gf256::add(1, gf256::mul(other, xi_inverse)));
            }
        }
        magnitudes.push(gf256::mul(omega.eval(xi_inverse), gf256::inv(denominator).ok()?));
    }
    Some(magnitudes)
}

#[cfg(test)]
mod should {
    use super::*;

    fn sample_block() -> Vec<u8> {
        let data: Vec<u8> = (0..19).map(|i| (i * 37 + 5) as u8).collect();
        let mut codeword = data.clone();
        codeword.extend(compute_ecc(&data, 7).unwrap());
        codeword
    }

    #[test]
    fn build_a_monic_generator_with_consecutive_roots() {
        let g = generator(10);
        assert_eq!(g.degree(), 10);
        assert_eq!(g.coefficient(10), 1);
        for i in 0..10 {
            assert_eq!(g.eval(gf256::exp(i)), 0, "alpha^{i} must be a root");
        }
        assert_ne!(g.eval(gf256::exp(10)), 0);
    }

    #[test]
    fn emit_codewords_that_vanish_at_the_generator_roots() {
        let codeword = sample_block();
        let as_poly = Poly::new(&codeword).unwrap();
        for i in 0..7 {
            assert_eq!(as_poly.eval(gf256::exp(i)), 0, "syndrome {i}");
        }
    }

    #[test]
    fn pass_an_intact_codeword_through() {
        let mut codeword = sample_block();
        let original = codeword.clone();
        assert_eq!(correct_errors(&mut codeword, 7).unwrap(), 0);
        assert_eq!(codeword, original);
    }

    #[test]
    fn repair_up_to_half_the_ecc_budget() {
        let original = sample_block();
        // t = 7 corrects floor(7/2) = 3 errors, anywhere in the block.
        for positions in [&[0usize][..], &[4, 20], &[1, 13, 25]] {
            let mut corrupted = original.clone();
            for &p in positions {
                corrupted[p] ^= 0xA5;
            }
            let fixed = correct_errors(&mut corrupted, 7).unwrap();
            assert_eq!(fixed, positions.len());
            assert_eq!(corrupted, original);
        }
    }

    #[test]
    fn refuse_a_hopeless_codeword() {
        let mut corrupted = sample_block();
        for (i, byte) in corrupted.iter_mut().enumerate() {
            *byte = byte.wrapping_add(i as u8 + 1);
        }
        // Far beyond t/2 errors: either detected or at least not "fixed"
        // back to the original without complaint.
        let original = sample_block();
        match correct_errors(&mut corrupted, 7) {
            Err(QrError::Uncorrectable) => {}
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => assert_ne!(corrupted, original),
        }
    }

    #[test]
    fn repair_errors_in_the_ecc_tail_too() {
        let original = sample_block();
        let mut corrupted = original.clone();
        corrupted[19] ^= 0xFF; // first ECC codeword
        corrupted[25] ^= 0x0F; // last ECC codeword
        correct_errors(&mut corrupted, 7).unwrap();
        assert_eq!(corrupted, original);
    }
}
