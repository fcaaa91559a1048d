/// Salted, adaptive password hashing (bcrypt).
///
/// Each `hash` call embeds a fresh random salt, so hashing the same input
/// twice yields different digests. `verify` recomputes with the embedded
/// salt and compares in constant time.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(plaintext, self.cost)
    }

    /// Returns false on mismatch and on a malformed digest, never an error.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}
