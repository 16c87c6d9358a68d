//! Human-shareable room codes.
//!
//! Six characters drawn from a 32-symbol alphabet that excludes the
//! visually ambiguous glyphs `0/O` and `1/I`. Codes are matched
//! case-insensitively at lookup time.

use rand::Rng;

/// The restricted room-code alphabet (32 symbols).
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Room code length.
pub const CODE_LEN: usize = 6;

/// Sample a random room code from the restricted alphabet.
pub fn generate(rng: &mut impl Rng) -> String {
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Normalize a user-entered code for lookup (uppercase, trimmed).
pub fn normalize(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}
