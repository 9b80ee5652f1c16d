/// This trait defines functions which provide configuration parameters to the
/// HTTP layer. Every parameter has a default, so an application only needs
/// to override the ones it cares about.
pub trait AppConfig {
    /// Returns the name of the cookie which holds the session id.
    ///
    /// Default is `"session_id"`.
    fn session_cookie_name(&self) -> &str {
        "session_id"
    }

    /// Indicates whether a `Same-Site: strict` header should be sent with the
    /// session cookie. If `false`, a `Same-Site: lax` header will be sent
    /// instead.
    ///
    /// Default is `false`.
    fn session_cookie_same_site_strict(&self) -> bool {
        false
    }

    /// Indicates whether the session cookie should only be sent over HTTPS.
    /// This should only be disabled for local development.
    ///
    /// Default is `true`.
    fn session_cookie_secure(&self) -> bool {
        true
    }
}

/// Uses the default value for every configuration parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl AppConfig for DefaultConfig {}
