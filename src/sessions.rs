use crate::{
    errors::Error,
    hashing,
    secret::Secret,
    service::AuthService,
    store::{CredentialStore, Criteria, StoreError, UserID, UserRecord, UserUpdate},
    users::unexpected,
};

impl<S: CredentialStore> AuthService<S> {
    /// Begins a new session for the user with this email address. A fresh
    /// random session id is generated, and its hash stored on the user's
    /// record; any previous session for the user stops working.
    ///
    /// Returns the raw session id, which should be issued to the client as
    /// a cookie.
    pub async fn create_session(&self, email: &str) -> Result<Secret, Error> {
        let user = self.store.find(Criteria::Email(email))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => Error::NotFound,
                e => unexpected(e),
            })?;

        let (session_id, hash) = hashing::generate_session_id_and_hash();
        self.store.update(user.id, UserUpdate::default().session(Some(hash)))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => Error::NotFound,
                e => unexpected(e),
            })?;

        log::debug!("Beginning session for user #{}", user.id);
        Ok(session_id)
    }

    /// Gets the user whose active session has this id. Returns `None` if the
    /// id is empty, or no user has a session with this id; this is the
    /// normal "not authenticated" outcome, not an error.
    pub async fn get_user_from_session(&self, session_id: &Secret) -> Option<UserRecord> {
        if session_id.is_empty() {
            return None;
        }

        let hash = hashing::fast_hash(session_id);
        match self.store.find(Criteria::SessionIdHash(&hash)).await {
            Ok(user) => Some(user),
            Err(e) => {
                log::debug!("No session found: {e}");
                None
            }
        }
    }

    /// Ends the active session of the user with this id, if there is one.
    /// Destroying a session is idempotent: if the user has no session, or
    /// does not exist, nothing happens.
    pub async fn destroy_session(&self, user_id: UserID) {
        log::debug!("Logging out user #{user_id}");

        match self.store.update(user_id, UserUpdate::default().session(None)).await {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                log::debug!("Cannot destroy session for unknown user #{user_id}");
            }
            Err(e) => {
                log::warn!("Failed to destroy session for user #{user_id}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        errors::Error,
        memory::MemoryStore,
        secret::Secret,
        service::AuthService,
        store::UserID,
    };

    async fn service_with_user() -> AuthService<MemoryStore> {
        let auth = AuthService::new(MemoryStore::new());
        auth.register_user("a@x.com", Secret::from("pw1")).await.unwrap();
        auth
    }

    #[actix_web::test]
    async fn test_session_round_trip() {
        let auth = service_with_user().await;
        let session_id = auth.create_session("a@x.com").await.unwrap();

        let user = auth.get_user_from_session(&session_id).await.unwrap();
        assert_eq!("a@x.com", user.email);
        assert!(user.has_session());

        // Only the hash of the session id is stored.
        let stored = user.session_id_hash.unwrap();
        assert_ne!(session_id.expose(), stored.expose());
    }

    #[actix_web::test]
    async fn test_second_session_replaces_first() {
        let auth = service_with_user().await;
        let first = auth.create_session("a@x.com").await.unwrap();
        let second = auth.create_session("a@x.com").await.unwrap();

        assert_ne!(first.expose(), second.expose());
        assert!(auth.get_user_from_session(&first).await.is_none());
        assert!(auth.get_user_from_session(&second).await.is_some());
    }

    #[actix_web::test]
    async fn test_create_session_unknown_email() {
        let auth = service_with_user().await;

        assert!(matches!(
            auth.create_session("b@x.com").await,
            Err(Error::NotFound),
        ));
    }

    #[actix_web::test]
    async fn test_get_user_from_bad_session() {
        let auth = service_with_user().await;
        auth.create_session("a@x.com").await.unwrap();

        assert!(auth.get_user_from_session(&Secret::from("")).await.is_none());
        assert!(auth.get_user_from_session(&Secret::from("nonsense")).await.is_none());
    }

    #[actix_web::test]
    async fn test_destroy_session_is_idempotent() {
        let auth = service_with_user().await;
        let session_id = auth.create_session("a@x.com").await.unwrap();
        let user = auth.get_user_from_session(&session_id).await.unwrap();

        auth.destroy_session(user.id).await;
        assert!(auth.get_user_from_session(&session_id).await.is_none());

        // Neither of these should panic or fail.
        auth.destroy_session(user.id).await;
        auth.destroy_session(UserID(9999)).await;
        assert!(auth.get_user_from_session(&session_id).await.is_none());
    }

    #[actix_web::test]
    async fn test_login_scenario() {
        let auth = AuthService::new(MemoryStore::new());
        auth.register_user("a@x.com", Secret::from("pw1")).await.unwrap();
        assert!(auth.valid_login("a@x.com", &Secret::from("pw1")).await);

        let session_id = auth.create_session("a@x.com").await.unwrap();
        let user = auth.get_user_from_session(&session_id).await.unwrap();
        assert_eq!("a@x.com", user.email);

        auth.destroy_session(user.id).await;
        assert!(auth.get_user_from_session(&session_id).await.is_none());
    }
}
