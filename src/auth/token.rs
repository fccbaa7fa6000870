use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a bearer token, as stored in `consumers.token_hash`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
