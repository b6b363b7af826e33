//! Arithmetic over GF(2^8) with the QR Code primitive polynomial 0x11D.
//!
//! The field is represented through a pair of exponent/logarithm tables
//! built at compile time: `EXP[i] = 2^i` and `LOG[EXP[i]] = i` for
//! `i` in `[0, 254]`. Addition is XOR; multiplication, inversion and
//! exponentiation go through the tables. `LOG[0]` is undefined and both
//! `log(0)` and `inv(0)` report a domain error.

use crate::error::QrError;

/// x^8 + x^4 + x^3 + x^2 + 1, the Model 2 field polynomial.
pub const PRIMITIVE: u16 = 0x11D;

const fn build_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    // alpha^255 wraps back to alpha^0, so exp() can index [0, 255] directly.
    exp[255] = exp[0];
    (exp, log)
}

const TABLES: ([u8; 256], [u8; 256]) = build_tables();

/// `EXP[i]` = alpha^i for i in [0, 255], with `EXP[255] = EXP[0]`.
pub const EXP: [u8; 256] = TABLES.0;

/// `LOG[alpha^i]` = i for i in [0, 254]; `LOG[0]` is a placeholder.
pub const LOG: [u8; 256] = TABLES.1;

/// Field addition (and subtraction).
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Field multiplication via the log/exp tables.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    } else {
        EXP[(usize::from(LOG[usize::from(a)]) + usize::from(LOG[usize::from(b)])) % 255]
    }
}

/// alpha^n for any integer n, normalised mod 255.
#[inline]
pub fn exp(n: i32) -> u8 {
    EXP[n.rem_euclid(255) as usize]
}

/// The discrete logarithm of `a`, undefined at zero.
#[inline]
pub fn log(a: u8) -> Result<u8, QrError> {
    if a == 0 {
        Err(QrError::Domain("log(0)"))
    } else {
        Ok(LOG[usize::from(a)])
    }
}

/// The multiplicative inverse of `a`, undefined at zero.
#[inline]
pub fn inv(a: u8) -> Result<u8, QrError> {
    if a == 0 {
        Err(QrError::Domain("inv(0)"))
    } else {
        Ok(EXP[255 - usize::from(LOG[usize::from(a)])])
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn generate_the_field_from_two() {
        assert_eq!(EXP[0], 1);
        assert_eq!(EXP[1], 2);
        assert_eq!(EXP[8], 0x1D); // 2^8 reduced by 0x11D
        // Every non-zero element appears exactly once in EXP[0..255].
        let mut seen = [false; 256];
        for &v in &EXP[..255] {
            assert!(!seen[usize::from(v)], "duplicate field element {v}");
            seen[usize::from(v)] = true;
        }
        assert!(!seen[0]);
    }

    #[test]
    fn wrap_exponents_mod_255() {
        assert_eq!(exp(255), 1);
        assert_eq!(exp(-1), EXP[254]);
        assert_eq!(exp(256), 2);
    }

    #[test]
    fn invert_log_with_exp() {
        for a in 1..=255u8 {
            assert_eq!(EXP[usize::from(log(a).unwrap())], a);
        }
    }

    #[test]
    fn multiply_by_inverse_to_one() {
        for a in 1..=255u8 {
            assert_eq!(mul(a, inv(a).unwrap()), 1);
        }
    }

    #[test]
    fn absorb_zero_in_products() {
        assert_eq!(mul(0, 0x53), 0);
        assert_eq!(mul(0x53, 0), 0);
    }

    #[test]
    fn distribute_multiplication_over_xor() {
        // Spot-check (a ^ b) * c == a*c ^ b*c on a few triples.
        for &(a, b, c) in &[(3u8, 7u8, 200u8), (90, 21, 254), (0x8E, 0x12, 0x42)] {
            assert_eq!(mul(add(a, b), c), add(mul(a, c), mul(b, c)));
        }
    }

    #[test]
    fn reject_zero_domain_inputs() {
        assert_eq!(log(0), Err(QrError::Domain("log(0)")));
        assert_eq!(inv(0), Err(QrError::Domain("inv(0)")));
    }
}
