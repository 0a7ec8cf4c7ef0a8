//! BLAKE3 content hashes used as cache keys.

use blake3::Hasher;

/// Hashes everything that determines a backend's answer for one committee member.
///
/// Fields are length-prefixed so `("ab", "c")` and `("a", "bc")` never collide.
pub fn hash_model_request(
    provider: &str,
    model: &str,
    temperature: f32,
    seed: Option<u64>,
    system: &str,
    user: &str,
) -> [u8; 32] {
    let mut hasher = Hasher::new();
    for part in [provider, model] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.update(&temperature.to_bits().to_le_bytes());
    match seed {
        Some(seed) => {
            hasher.update(&[1]);
            hasher.update(&seed.to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
    for part in [system, user] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Lowercase hex rendering of a digest, for use in string cache keys.
pub fn to_hex(hash: &[u8; 32]) -> String {
    blake3::Hash::from_bytes(*hash).to_hex().to_string()
}
