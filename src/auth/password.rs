use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Hash a password for storage as `hex(salt)$hex(sha256(salt || password))`.
pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = digest_with_salt(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check a candidate password against a stored digest. Malformed stored
/// values simply fail the check.
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };
    digest_with_salt(&salt, password).as_slice() == expected.as_slice()
}

fn digest_with_salt(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_the_original_password() {
        let stored = hash("s3nh4-segura");
        assert!(verify("s3nh4-segura", &stored));
        assert!(!verify("s3nha-segura", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash("same-password"), hash("same-password"));
    }

    #[test]
    fn malformed_stored_values_never_verify() {
        assert!(!verify("anything", ""));
        assert!(!verify("anything", "no-separator"));
        assert!(!verify("anything", "zz$not-hex"));
    }
}
