mod config;
mod cookies;
mod errors;
mod hashing;
mod memory;
pub mod redact;
pub mod routes;
mod secret;
mod service;
mod sessions;
mod store;
mod users;

pub use config::{
    AppConfig,
    DefaultConfig,
};
pub use cookies::SessionCookie;
pub use errors::Error;
pub use hashing::{
    RESET_TOKEN_BYTES,
    SESSION_ID_BYTES,
};
pub use memory::MemoryStore;
pub use secret::{
    PasswordHash,
    Secret,
};
pub use service::AuthService;
pub use store::{
    CredentialStore,
    Criteria,
    StoreError,
    UserID,
    UserRecord,
    UserUpdate,
};
