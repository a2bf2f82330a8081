//! Order number generation.

use std::fmt::Debug;

use jiff::Timestamp;
use rand::{Rng, thread_rng};

use crate::domain::orders::models::OrderNumber;

/// Unambiguous characters: no `0/O` or `1/I`.
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 8;

/// Source of candidate order numbers.
///
/// Candidates need not be unique; the orders table's unique constraint is the
/// arbiter and a colliding candidate is simply replaced by a fresh one.
pub trait OrderNumberGenerator: Debug + Send + Sync {
    fn generate(&self) -> OrderNumber;
}

/// `ORD-YYYYMMDD-XXXXXXXX` with a random suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderNumbers;

impl OrderNumberGenerator for RandomOrderNumbers {
    fn generate(&self) -> OrderNumber {
        let mut rng = thread_rng();

        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();

        OrderNumber::new(format!(
            "ORD-{}-{suffix}",
            Timestamp::now().strftime("%Y%m%d")
        ))
    }
}
