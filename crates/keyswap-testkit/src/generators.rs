//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keyswap_core::{BigUint, Ciphertext, PartyId};

/// Generate a valid party id.
pub fn party_id() -> impl Strategy<Value = PartyId> {
    "[a-z][a-z0-9_-]{0,15}".prop_filter_map("valid party id", |s| PartyId::new(s).ok())
}

/// Generate two distinct party ids.
pub fn distinct_pair() -> impl Strategy<Value = (PartyId, PartyId)> {
    (party_id(), party_id()).prop_filter("distinct parties", |(a, b)| a != b)
}

/// Generate a character whose code point is below `limit`, skipping the
/// surrogate range.
pub fn char_below(limit: u32) -> impl Strategy<Value = char> {
    (0..limit.max(1)).prop_filter_map("scalar value", char::from_u32)
}

/// Generate a plaintext of up to `max_len` characters, each below `limit`.
pub fn plaintext(limit: u32, max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(char_below(limit), 0..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Generate a plaintext of distinct characters, at least two long.
pub fn distinct_plaintext(limit: u32, max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::btree_set(char_below(limit), 2..=max_len.max(2))
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(|chars| chars.into_iter().collect())
}

/// Generate the decimal text of a shared secret.
pub fn secret_text() -> impl Strategy<Value = String> {
    (1u8..=26).prop_map(|v| v.to_string())
}

/// Generate an arbitrary ciphertext with values below `limit`.
pub fn ciphertext(limit: u64, max_len: usize) -> impl Strategy<Value = Ciphertext> {
    prop::collection::vec(0..limit.max(1), 0..=max_len)
        .prop_map(|values| Ciphertext::from_values(values.into_iter().map(BigUint::from).collect()))
}

/// Generate a sequence of exchange requests over `parties` parties, as
/// index pairs. Pairs may repeat, reverse, or name the same party twice.
pub fn exchange_calls(
    parties: usize,
    max_calls: usize,
) -> impl Strategy<Value = Vec<(usize, usize)>> {
    let n = parties.max(1);
    prop::collection::vec((0..n, 0..n), 1..=max_calls.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_party_ids_are_valid(id in party_id()) {
            prop_assert!(!id.as_str().is_empty());
        }

        #[test]
        fn test_plaintext_respects_limit(text in plaintext(3233, 32)) {
            prop_assert!(text.chars().all(|c| (c as u32) < 3233));
        }

        #[test]
        fn test_distinct_plaintext(text in distinct_plaintext(3233, 8)) {
            let mut chars: Vec<char> = text.chars().collect();
            let len = chars.len();
            chars.sort_unstable();
            chars.dedup();
            prop_assert_eq!(chars.len(), len);
            prop_assert!(len >= 2);
        }

        #[test]
        fn test_secret_text_parses(text in secret_text()) {
            let value: u8 = text.parse().unwrap();
            prop_assert!((1..=26).contains(&value));
        }
    }
}
