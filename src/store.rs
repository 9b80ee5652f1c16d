use std::fmt::Display;

use crate::secret::{PasswordHash, Secret};

/// The unique id of a user record, assigned by the store when the record is
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserID(pub i64);

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserID> for i64 {
    fn from(id: UserID) -> Self {
        id.0
    }
}

/// A stored user. The session id and reset token are kept only as fast
/// hashes of the values issued to the client; see `hashing::fast_hash`.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserID,
    pub email: String,
    pub hashed_password: PasswordHash,

    /// Present only while the user has an active session.
    pub session_id_hash: Option<Secret>,

    /// Present only while a password reset is pending.
    pub reset_token_hash: Option<Secret>,
}

impl UserRecord {
    pub fn has_session(&self) -> bool {
        self.session_id_hash.is_some()
    }

    pub fn has_pending_reset(&self) -> bool {
        self.reset_token_hash.is_some()
    }
}

/// Selects a user record by an exact match on exactly one field.
#[derive(Debug, Clone, Copy)]
pub enum Criteria<'a> {
    Id(UserID),
    Email(&'a str),
    SessionIdHash(&'a Secret),
    ResetTokenHash(&'a Secret),
}

impl Criteria<'_> {
    /// Determines whether the given record matches these criteria. Hashes
    /// are compared in constant time.
    pub fn matches(&self, user: &UserRecord) -> bool {
        let hash_matches = |stored: &Option<Secret>, wanted: &Secret| {
            stored.as_ref()
                .is_some_and(|stored| stored.constant_time_eq(wanted))
        };

        match *self {
            Self::Id(id) => user.id == id,
            Self::Email(email) => user.email == email,
            Self::SessionIdHash(hash) => hash_matches(&user.session_id_hash, hash),
            Self::ResetTokenHash(hash) => hash_matches(&user.reset_token_hash, hash),
        }
    }
}

/// A partial update to a user record. Fields which are `None` are left
/// unchanged; the nullable fields can be either set or cleared.
///
/// An update may also carry a precondition on the stored reset token hash;
/// the store must check it and apply the update in the same critical
/// section, so that a reset token is consumed at most once.
///
/// Construct with `UserUpdate::default()` and the builder methods.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub hashed_password: Option<PasswordHash>,
    pub session_id_hash: Option<Option<Secret>>,
    pub reset_token_hash: Option<Option<Secret>>,
    pub expected_reset_token_hash: Option<Secret>,
}

impl UserUpdate {
    pub fn password(mut self, hash: PasswordHash) -> Self {
        self.hashed_password = Some(hash);
        self
    }

    pub fn session(mut self, hash: Option<Secret>) -> Self {
        self.session_id_hash = Some(hash);
        self
    }

    pub fn reset_token(mut self, hash: Option<Secret>) -> Self {
        self.reset_token_hash = Some(hash);
        self
    }

    /// Only apply the update if the record currently holds this reset token
    /// hash.
    pub fn if_reset_token(mut self, hash: Secret) -> Self {
        self.expected_reset_token_hash = Some(hash);
        self
    }

    /// Checks the update's precondition, if any, against the stored record.
    pub fn precondition_holds(&self, user: &UserRecord) -> bool {
        match &self.expected_reset_token_hash {
            Some(expected) => Criteria::ResetTokenHash(expected).matches(user),
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hashed_password.is_none()
            && self.session_id_hash.is_none()
            && self.reset_token_hash.is_none()
    }

    /// Applies this update to a record in place.
    pub fn apply_to(self, user: &mut UserRecord) {
        if let Some(hash) = self.hashed_password {
            user.hashed_password = hash;
        }
        if let Some(hash) = self.session_id_hash {
            user.session_id_hash = hash;
        }
        if let Some(hash) = self.reset_token_hash {
            user.reset_token_hash = hash;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record matches the criteria or id.
    #[error("no matching user record")]
    NotFound,

    /// A record with this email address already exists.
    #[error("a user with this email already exists")]
    DuplicateEmail,
}

/// This trait defines the functions which will be used by `AuthService` to
/// store and retrieve user records. Each call must behave as a single
/// transaction: in particular, `update` must apply all of its fields to the
/// record atomically.
#[trait_variant::make(Send)]
pub trait CredentialStore {
    /// Inserts a new user record, returning it with its new unique id.
    ///
    /// Returns `StoreError::DuplicateEmail` if a record with this email
    /// already exists. The store is the authority for email uniqueness, even
    /// if the caller has already checked.
    async fn add(
        &self,
        email: &str,
        hashed_password: PasswordHash,
    ) -> Result<UserRecord, StoreError>;

    /// Gets the user record matching the criteria. If there are several,
    /// the one with the lowest id is returned.
    ///
    /// Returns `StoreError::NotFound` if there is no match.
    async fn find(&self, criteria: Criteria<'_>) -> Result<UserRecord, StoreError>;

    /// Applies a partial update to the user record with the given id. The
    /// update's precondition must be checked atomically with applying it.
    ///
    /// Returns `StoreError::NotFound` if there is no user with that id, or
    /// the precondition does not hold; in that case nothing is changed.
    async fn update(&self, user_id: UserID, fields: UserUpdate) -> Result<(), StoreError>;
}
