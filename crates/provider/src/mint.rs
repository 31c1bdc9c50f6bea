//! Minting of new `v3` identifiers.

use uuid::Uuid;

/// Consonants and digits that cannot be mistaken for one another.
const ALPHABET: &[u8] = b"bcdfghjkmnpqrstvwxyzBCDFGHJKLMNPQRSTVWXYZ3456789";
/// 48^23 exceeds 2^128, so every bit of the UUID ends up in the identifier.
pub const V3_LENGTH: usize = 23;

/// Mints a new random `v3`: a version 4 UUID rewritten in base 48.
///
/// Uniqueness is not checked here; the registry's unique index on `v3` is the
/// final arbiter.
pub fn mint_v3() -> String {
    let base = ALPHABET.len() as u128;
    let mut value = Uuid::new_v4().as_u128();
    let mut v3 = String::with_capacity(V3_LENGTH);
    for _ in 0..V3_LENGTH {
        v3.push(char::from(ALPHABET[(value % base) as usize]));
        value /= base;
    }
    v3
}
