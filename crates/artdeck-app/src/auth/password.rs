//! PBKDF2 password hashing

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use artdeck_core::prelude::*;

pub const ITERATIONS: u32 = 100_000;
pub const KEY_LEN: usize = 64;
pub const SALT_LEN: usize = 32;

/// Base64 encoded key and salt of a hashed password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub key: String,
    pub salt: String,
}

/// Hash with a fresh random salt
pub fn hash_password(password: &str) -> HashedPassword {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with_salt_bytes(password, &salt)
}

/// Hash with a stored base64 salt
pub fn hash_with_salt(password: &str, salt: &str) -> Result<HashedPassword> {
    let salt = STANDARD
        .decode(salt.as_bytes())
        .map_err(|e| Error::auth(format!("invalid salt encoding: {}", e)))?;
    Ok(hash_with_salt_bytes(password, &salt))
}

fn hash_with_salt_bytes(password: &str, salt: &[u8]) -> HashedPassword {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut key);
    HashedPassword {
        key: STANDARD.encode(key),
        salt: STANDARD.encode(salt),
    }
}

/// Check `password` against a stored key and salt
pub fn verify_password(password: &str, key: &str, salt: &str) -> Result<bool> {
    let hashed = hash_with_salt(password, salt)?;
    Ok(constant_time_eq(hashed.key.as_bytes(), key.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
