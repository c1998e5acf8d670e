use sha2::{Digest, Sha256};

pub fn hash_source(original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}
