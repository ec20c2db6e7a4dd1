//! Product identifier generation.
//!
//! Ids are `<base36 unix millis>-<8 random base36 chars>`. Uniqueness is
//! probabilistic only: nothing detects or handles collisions.

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 8;
const SEPARATOR: char = '-';

/// Returns a fresh product id.
#[must_use]
pub fn generate_id() -> String {
    generate_id_at(Utc::now())
}

/// Returns an id whose timestamp prefix encodes `at`.
#[must_use]
pub fn generate_id_at(at: DateTime<Utc>) -> String {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{}{SEPARATOR}{random}", to_base36(millis))
}

/// Decodes the timestamp prefix of an id produced by [`generate_id`].
///
/// Returns `None` for ids minted elsewhere (seed catalog ids, remote uuids).
#[must_use]
pub fn id_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let (prefix, random) = id.split_once(SEPARATOR)?;
    if random.len() != RANDOM_LEN || prefix.is_empty() {
        return None;
    }
    let millis = u64::from_str_radix(prefix, 36).ok()?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
