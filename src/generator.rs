//! Short identifier generation
//!
//! Produces compact random codes for short URLs. The generator carries no
//! state and makes no uniqueness promise; the service retries on insert
//! collisions.

use rand::{distr::Alphanumeric, Rng};

/// Length of every generated short id.
pub const SHORT_ID_LEN: usize = 6;

/// Returns a random alphanumeric short id.
pub fn short_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_ID_LEN)
        .map(char::from)
        .collect()
}
