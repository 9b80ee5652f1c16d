use crate::store::CredentialStore;

/// Implements registration, login verification, sessions and password resets
/// on top of a `CredentialStore`. The store is injected at construction, and
/// the service holds no user data between calls.
///
/// The operations are split across the `users` and `sessions` modules.
pub struct AuthService<S> {
    pub(crate) store: S,
}

impl<S: CredentialStore> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self {store}
    }

    /// Gets a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
