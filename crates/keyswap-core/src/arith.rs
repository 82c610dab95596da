//! Big-integer helpers that `num-bigint` does not provide directly.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::{CoreError, Result};

/// Modular multiplicative inverse of `a` modulo `modulus`.
///
/// Returns `None` when `gcd(a, modulus) != 1` or `modulus` is zero.
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    if modulus.is_zero() {
        return None;
    }
    if modulus.is_one() {
        return Some(BigUint::zero());
    }

    let a = BigInt::from(a % modulus);
    let m = BigInt::from(modulus.clone());
    let egcd = a.extended_gcd(&m);
    if !egcd.gcd.is_one() {
        return None;
    }

    egcd.x.mod_floor(&m).to_biguint()
}

/// Whether `a` and `b` share no factor other than one.
pub fn is_coprime(a: &BigUint, b: &BigUint) -> bool {
    a.gcd(b).is_one()
}

/// Parse a base-10 string of ASCII digits.
///
/// Stricter than `BigUint::parse_bytes`: signs, separators and whitespace are
/// rejected so the text form round-trips exactly.
pub fn parse_decimal(text: &str) -> Option<BigUint> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(text.as_bytes(), 10)
}

/// Parse a decimal key component, naming the field on failure.
pub(crate) fn parse_key_component(field: &str, text: &str) -> Result<BigUint> {
    parse_decimal(text).ok_or_else(|| {
        CoreError::InvalidKeyFormat(format!("field `{field}` is not a base-10 integer"))
    })
}
