//! Polynomials over GF(2^8), the working representation for Reed-Solomon
//! encoding and decoding.

use crate::error::QrError;
use crate::gf256;

/// A polynomial with coefficients stored highest degree first.
///
/// The leading coefficient is non-zero except for the zero polynomial,
/// which is the single-element sequence `[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    coefficients: Vec<u8>,
}

impl Poly {
    /// Builds a polynomial from coefficients (highest degree first),
    /// stripping redundant leading zeros.
    pub fn new(coefficients: &[u8]) -> Result<Self, QrError> {
        if coefficients.is_empty() {
            return Err(QrError::Domain("empty coefficient array"));
        }
        let first_nonzero = coefficients.iter().position(|&c| c != 0);
        Ok(match first_nonzero {
            None => Self::zero(),
            Some(i) => Self { coefficients: coefficients[i..].to_vec() },
        })
    }

    pub fn zero() -> Self {
        Self { coefficients: vec![0] }
    }

    pub fn one() -> Self {
        Self { coefficients: vec![1] }
    }

    /// `coefficient * x^degree`.
    pub fn monomial(degree: usize, coefficient: u8) -> Self {
        if coefficient == 0 {
            return Self::zero();
        }
        let mut coefficients = vec![0; degree + 1];
        coefficients[0] = coefficient;
        Self { coefficients }
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// The coefficient of the `x^degree` term, zero when absent.
    pub fn coefficient(&self, degree: usize) -> u8 {
        if degree > self.degree() {
            0
        } else {
            self.coefficients[self.coefficients.len() - 1 - degree]
        }
    }

    /// Evaluates the polynomial at `x` by Horner's scheme.
    pub fn eval(&self, x: u8) -> u8 {
        if x == 0 {
            return self.coefficient(0);
        }
        let mut result = 0u8;
        for &c in &self.coefficients {
            result = gf256::add(gf256::mul(result, x), c);
        }
        result
    }

    /// Pointwise XOR after aligning lengths; addition and subtraction
    /// coincide in characteristic 2.
    pub fn add_or_subtract(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let (small, large) = if self.coefficients.len() <= other.coefficients.len() {
            (&self.coefficients, &other.coefficients)
        } else {
            (&other.coefficients, &self.coefficients)
        };
        let offset = large.len() - small.len();
        let mut sum = large.clone();
        for (i, &c) in small.iter().enumerate() {
            sum[offset + i] ^= c;
        }
        Self::new(&sum).unwrap_or_else(|_| Self::zero())
    }

    /// Schoolbook product, O(n * m).
    pub fn multiply(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let a = &self.coefficients;
        let b = &other.coefficients;
        let mut product = vec![0u8; a.len() + b.len() - 1];
        for (i, &ac) in a.iter().enumerate() {
            for (j, &bc) in b.iter().enumerate() {
                product[i + j] ^= gf256::mul(ac, bc);
            }
        }
        Self { coefficients: product }
    }

    pub fn multiply_scalar(&self, scalar: u8) -> Self {
        if scalar == 0 {
            return Self::zero();
        }
        if scalar == 1 {
            return self.clone();
        }
        let coefficients = self.coefficients.iter().map(|&c| gf256::mul(c, scalar)).collect();
        Self { coefficients }
    }

    /// `self * coefficient * x^degree`.
    pub fn multiply_by_monomial(&self, degree: usize, coefficient: u8) -> Self {
        if coefficient == 0 || self.is_zero() {
            return Self::zero();
        }
        let mut coefficients = Vec::with_capacity(self.coefficients.len() + degree);
        coefficients.extend(self.coefficients.iter().map(|&c| gf256::mul(c, coefficient)));
        coefficients.extend(std::iter::repeat(0).take(degree));
        Self { coefficients }
    }

    /// Remainder of `self / divisor` by repeated subtraction of the
    /// divisor scaled to cancel the leading term.
    pub fn rem(&self, divisor: &Self) -> Result<Self, QrError> {
        if divisor.is_zero() {
            return Err(QrError::Domain("division by zero polynomial"));
        }
        let leading_inv = gf256::inv(divisor.coefficient(divisor.degree()))?;
        let mut remainder = self.clone();
        while !remainder.is_zero() && remainder.degree() >= divisor.degree() {
            let degree_diff = remainder.degree() - divisor.degree();
            let scale = gf256::mul(remainder.coefficient(remainder.degree()), leading_inv);
            remainder = remainder.add_or_subtract(&divisor.multiply_by_monomial(degree_diff, scale));
        }
        Ok(remainder)
    }
}
