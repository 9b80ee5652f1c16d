use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string (a password, session id, reset token, or a hash of one).
/// Use `Secret::from` to convert a `String` to a `Secret`, and
/// `secret.expose()` to access the string value where necessary.
///
/// Secrets are redacted in `std::fmt::Debug` displays, and are automatically
/// zeroed-out in memory when the value is dropped.
#[derive(Clone)]
pub struct Secret(pub(crate) String);

/// The salted password hash stored for a user, in PHC string format. Use
/// `PasswordHash::from` to convert a `String` to a `PasswordHash`, and
/// `hash.expose()` to access the string value where necessary.
#[derive(Clone)]
pub struct PasswordHash(pub(crate) Secret);

impl Secret {
    /// Make use of this secret as a `&str`. This may be needed when sending a
    /// secret to the client, or storing a hashed secret in the database.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compares two secrets in constant time.
    pub fn constant_time_eq(&self, other: &Secret) -> bool {
        constant_time_eq::constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for Secret {}

impl PasswordHash {
    /// Make use of this password hash as a `&str`. This may be needed when
    /// storing in the database.
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl From<String> for Secret {
    fn from(string: String) -> Self {
        Self(string)
    }
}

impl From<&str> for Secret {
    fn from(string: &str) -> Self {
        Self(string.to_string())
    }
}

impl From<String> for PasswordHash {
    fn from(string: String) -> Self {
        Self(Secret(string))
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[SECRET]")
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[SECRET]")
    }
}

impl<'de> serde::Deserialize<'de> for Secret {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)
            .map(Self::from)
    }
}

#[cfg(test)]
mod test {
    use super::{PasswordHash, Secret};

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::from("hunter2");
        let hash = PasswordHash::from("$argon2id$...".to_string());

        assert_eq!("[SECRET]", format!("{secret:?}"));
        assert_eq!("[SECRET]", format!("{hash:?}"));
    }

    #[test]
    fn test_constant_time_eq() {
        let a = Secret::from("abcdef");

        assert!(a.constant_time_eq(&Secret::from("abcdef")));
        assert!(!a.constant_time_eq(&Secret::from("abcdeg")));
        assert!(!a.constant_time_eq(&Secret::from("abc")));
    }
}
