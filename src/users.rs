use crate::{
    errors::Error,
    hashing,
    secret::Secret,
    service::AuthService,
    store::{CredentialStore, Criteria, StoreError, UserRecord, UserUpdate},
};

impl<S: CredentialStore> AuthService<S> {
    /// Registers a new user with the password they have chosen. The password
    /// is stored only as a salted hash.
    ///
    /// Returns the registered user with their unique id, or
    /// `Error::AlreadyRegistered` if the email address is taken; in that case
    /// the existing record is not modified.
    pub async fn register_user(&self, email: &str, password: Secret) -> Result<UserRecord, Error> {
        match self.store.find(Criteria::Email(email)).await {
            Ok(_) => {
                log::info!("Registration rejected; email={email}; already exists");
                return Err(Error::AlreadyRegistered);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(unexpected(e)),
        }

        let hash = hashing::generate_password_hash(&password)?;

        // The store is the authority on uniqueness; another registration for
        // the same email may have completed since the check above.
        let user = self.store.add(email, hash)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateEmail => Error::AlreadyRegistered,
                e => unexpected(e),
            })?;

        log::info!("Registered user #{}; email={email};", user.id);
        Ok(user)
    }

    /// Checks an email and password combination. This never fails: an
    /// unknown email, a wrong password, or an unreadable stored hash all give
    /// `false`.
    pub async fn valid_login(&self, email: &str, password: &Secret) -> bool {
        let Ok(user) = self.store.find(Criteria::Email(email)).await else {
            log::debug!("Login attempt for unknown user; email={email};");
            return false;
        };

        match hashing::verify_password(&user.hashed_password, password) {
            Ok(valid) => {
                log::debug!("Password check for user #{}: {}", user.id, valid);
                valid
            }
            Err(e) => {
                log::warn!("Stored password hash for user #{} is unusable: {e}", user.id);
                false
            }
        }
    }

    /// Begins a password reset for the user with this email address. A fresh
    /// reset token is generated and its hash stored, replacing any token
    /// issued earlier.
    ///
    /// Returns the raw token, which authorizes one call to `update_password`.
    pub async fn get_reset_token(&self, email: &str) -> Result<Secret, Error> {
        let user = self.store.find(Criteria::Email(email))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => Error::UnknownEmail,
                e => unexpected(e),
            })?;

        let (token, hash) = hashing::generate_reset_token_and_hash();
        self.store.update(user.id, UserUpdate::default().reset_token(Some(hash)))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => Error::UnknownEmail,
                e => unexpected(e),
            })?;

        log::info!("Issued password reset token for user #{}", user.id);
        Ok(token)
    }

    /// Completes a password reset. The new password is hashed and stored, and
    /// the reset token is cleared in the same update, so it cannot be used
    /// again.
    ///
    /// The update only applies if the record still holds this token when the
    /// store commits it. Of several concurrent calls with the same token, at
    /// most one succeeds, and a token issued in the meantime is not wiped.
    pub async fn update_password(&self, reset_token: &Secret, new_password: Secret) -> Result<(), Error> {
        if reset_token.is_empty() {
            return Err(Error::InvalidResetToken);
        }

        let token_hash = hashing::fast_hash(reset_token);
        let user = self.store.find(Criteria::ResetTokenHash(&token_hash))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => Error::InvalidResetToken,
                e => unexpected(e),
            })?;

        let new_hash = hashing::generate_password_hash(&new_password)?;
        let update = UserUpdate::default()
            .password(new_hash)
            .reset_token(None)
            .if_reset_token(token_hash);
        self.store.update(user.id, update)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => Error::InvalidResetToken,
                e => unexpected(e),
            })?;

        log::info!("Password updated for user #{}", user.id);
        Ok(())
    }
}

/// Maps a store error which the calling operation has no specific outcome
/// for. With the current `StoreError` variants this only happens when the
/// store breaks its contract, e.g. reporting a duplicate email on lookup.
pub(crate) fn unexpected(e: StoreError) -> Error {
    log::error!("Unexpected credential store error: {e}");
    match e {
        StoreError::DuplicateEmail => Error::AlreadyRegistered,
        StoreError::NotFound => Error::NotFound,
    }
}
