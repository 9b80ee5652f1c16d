use argon2::Argon2;
use password_hash::{
    PasswordHasher,
    PasswordVerifier,
    SaltString,
};

use crate::{
    errors::Error,
    secret::{PasswordHash, Secret},
};

/// The number of bytes of entropy in a session id. This must be at least 16
/// (128 bits); OWASP recommends at least 8 bytes of entropy.
/// https://cheatsheetseries.owasp.org/cheatsheets/Session_Management_Cheat_Sheet.html#session-id-entropy
///
/// We round up to the next multiple of three, since the id is encoded in
/// base64, so each three unencoded bytes become four encoded bytes. If the
/// number of bytes is not a multiple of 3, the encoded id will end with
/// filler characters which add no entropy.
pub const SESSION_ID_BYTES: usize = 18;

/// The number of bytes of entropy in a password reset token.
pub const RESET_TOKEN_BYTES: usize = 18;

/// Checks a password against a stored password hash. Returns `Ok(false)` if
/// the password is wrong, and an error if the stored hash is malformed or
/// uses an unsupported algorithm.
///
/// The comparison is done by the hashing library, in constant time.
pub(crate) fn verify_password(stored_hash: &PasswordHash, given_password: &Secret) -> Result<bool, Error> {
    let hash = password_hash::PasswordHash::new(stored_hash.expose())
        .map_err(Error::Hasher)?;

    let algs: &[&dyn PasswordVerifier] = &[&Argon2::default()];
    match hash.verify_password(algs, given_password.expose()) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Hasher(e)),
    }
}

/// Computes a password hash for the given password, which can be stored in the
/// database. A strong password hashing algorithm with a fresh random salt is
/// used, so hashing the same password twice gives different results.
///
/// This function cannot be used to compare a password against a stored hash;
/// instead, use the `verify_password` function.
pub(crate) fn generate_password_hash(new_password: &Secret) -> Result<PasswordHash, Error> {
    let salt = SaltString::generate(rand::thread_rng());

    let hash = Argon2::default()
        .hash_password(new_password.expose().as_bytes(), &salt)
        .map_err(Error::Hasher)?;

    Ok(PasswordHash::from(hash.to_string()))
}

/// Generates a new random session id, and its hash. The hash should be stored
/// in the database, and the raw id should be issued to the client as a
/// cookie.
///
/// Returns `(session_id, hash)`.
pub(crate) fn generate_session_id_and_hash() -> (Secret, Secret) {
    generate_token_and_fast_hash::<SESSION_ID_BYTES>()
}

/// Randomly generates a new password reset token, returning it and its hash.
pub(crate) fn generate_reset_token_and_hash() -> (Secret, Secret) {
    generate_token_and_fast_hash::<RESET_TOKEN_BYTES>()
}

fn generate_token_and_fast_hash<const N: usize>() -> (Secret, Secret) {
    let raw = generate_base64_token::<N>();
    let hash = fast_hash(&raw);

    (raw, hash)
}

/// Computes a fast hash of a session id or reset token. The hash is
/// cryptographically secure, but not suitable for passwords.
///
/// A fast hash is used for session ids, because they are looked up on every
/// request, and a slow hash would be unacceptable for performance.
///
/// Both session ids and reset tokens are generated randomly with high
/// entropy, not chosen by the user, so there is no real benefit to using a
/// slow hash or salt for them. Hashing without a salt also keeps the lookup
/// an exact match on the stored value.
pub(crate) fn fast_hash(s: &Secret) -> Secret {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(s.expose());
    let hash = &hasher.finalize();
    Secret(base64_encode(hash))
}

/// Generates a random token with `N` bytes of entropy, base64-encoded. The
/// encoded token is URL-safe.
fn generate_base64_token<const N: usize>() -> Secret {
    use rand::{thread_rng, Rng};

    let mut bytes = [0u8; N];
    thread_rng().fill(&mut bytes as &mut [u8]);
    Secret(base64_encode(&bytes))
}

fn base64_encode(bytes: &[u8]) -> String {
    // Reset tokens may be put in URLs, and session ids in cookies
    use base64::{engine::general_purpose::URL_SAFE, Engine};
    URL_SAFE.encode(bytes)
}
