use rand::RngCore;
use sha2::{Digest, Sha256};

/// Reset links die after this many minutes.
pub const RESET_TTL_MINUTES: i64 = 30;

/// Generates a one-time password-reset secret.
///
/// Returns `(plaintext, hash)`. The plaintext goes into the emailed link and
/// is never stored; only the SHA-256 digest is persisted, so a leaked
/// database row cannot be turned back into a usable link.
pub fn issue_secret() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    let hash = hash_secret(&plaintext);
    (plaintext, hash)
}

/// One-way digest of a reset secret, hex-encoded for storage and lookup.
pub fn hash_secret(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Plain-text body of the password-reset email.
pub fn reset_message(reset_url: &str) -> String {
    format!(
        "You are receiving this email because you (or someone else) requested a password reset.\n\
         \n\
         Open the link below to choose a new password. The link expires in {RESET_TTL_MINUTES} minutes:\n\
         \n\
         {reset_url}\n\
         \n\
         If you did not request this, you can safely ignore this email."
    )
}
