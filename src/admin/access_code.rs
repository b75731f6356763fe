/// One-time admin access codes
use rand::Rng;

pub const CODE_PREFIX: &str = "ADMIN-";

/// No 0/O or 1/I, so codes survive being read aloud or retyped
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 8;

/// Generate a fresh access code, e.g. `ADMIN-AB3X9KPQ`
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("{}{}", CODE_PREFIX, body)
}

/// Canonical form used for matching
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Canonical form of `input` when it is shaped like an access code
pub fn as_access_code(input: &str) -> Option<String> {
    let candidate = normalize_code(input);
    let body = candidate.strip_prefix(CODE_PREFIX)?;

    if body.len() == CODE_LENGTH && body.bytes().all(|b| ALPHABET.contains(&b)) {
        Some(candidate)
    } else {
        None
    }
}
