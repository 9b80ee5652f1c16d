use actix_web::{
    cookie::{Cookie, SameSite},
    http::header::{HeaderName, HeaderValue},
    HttpRequest,
    HttpResponseBuilder,
};

use crate::{
    config::AppConfig,
    secret::Secret,
};

/// The attributes of the session cookie, taken from an `AppConfig` when the
/// routes are configured.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    same_site_strict: bool,
    secure: bool,
}

/// Represents an action to be taken to update the client's session cookie.
pub(crate) enum SessionCookieAction {
    Issue(Secret),
    Revoke,
}

impl SessionCookie {
    pub fn from_config(config: &impl AppConfig) -> Self {
        Self {
            name: config.session_cookie_name().to_string(),
            same_site_strict: config.session_cookie_same_site_strict(),
            secure: config.session_cookie_secure(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the session id from the request's cookie, if there is one.
    pub(crate) fn read(&self, request: &HttpRequest) -> Option<Secret> {
        let Some(cookie) = request.cookie(&self.name) else {
            log::debug!("Request has no session cookie");
            return None;
        };

        // Sadly, the `actix_web` and `cookie` crates don't provide any API for
        // securely zeroizing cookies after use; this is the best we can easily do.
        let session_id = Secret(cookie.value().to_string());
        drop(cookie);

        Some(session_id)
    }

    /// Builds the cookie for an action, with the appropriate attributes.
    /// https://cheatsheetseries.owasp.org/cheatsheets/Session_Management_Cheat_Sheet.html#cookies
    fn build(&self, action: SessionCookieAction) -> Cookie<'static> {
        match action {
            SessionCookieAction::Issue(session_id) => {
                log::debug!("Issuing session cookie");

                let mut cookie = Cookie::new(self.name.clone(), session_id.expose().to_string());
                cookie.set_path("/");

                // HTTP-only cookies are not visible to client-side JavaScript.
                cookie.set_http_only(true);
                cookie.set_secure(self.secure);
                cookie.set_same_site(if self.same_site_strict {
                    SameSite::Strict
                } else {
                    SameSite::Lax
                });
                cookie
            }
            SessionCookieAction::Revoke => {
                log::debug!("Revoking session cookie");

                // Revoke cookie by setting new empty, expired cookie of the same name.
                let mut cookie = Cookie::new(self.name.clone(), "");
                cookie.set_path("/");
                cookie.make_removal();
                cookie
            }
        }
    }

    /// Adds the cookie for this action to a response.
    pub(crate) fn apply(&self, action: SessionCookieAction, response: &mut HttpResponseBuilder) {
        // Tell the client not to cache the session cookie.
        // https://cheatsheetseries.owasp.org/cheatsheets/Session_Management_Cheat_Sheet.html#web-content-caching
        response.append_header((
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-cache=\"Set-Cookie, Set-Cookie2\""),
        ));
        response.cookie(self.build(action));
    }
}

#[cfg(test)]
mod test {
    use actix_web::cookie::SameSite;

    use super::{SessionCookie, SessionCookieAction};
    use crate::{config::{AppConfig, DefaultConfig}, secret::Secret};

    struct StrictConfig;

    impl AppConfig for StrictConfig {
        fn session_cookie_name(&self) -> &str {
            "sid"
        }

        fn session_cookie_same_site_strict(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_issue_cookie() {
        let settings = SessionCookie::from_config(&DefaultConfig);
        let cookie = settings.build(SessionCookieAction::Issue(Secret::from("abc")));

        assert_eq!("session_id", cookie.name());
        assert_eq!("abc", cookie.value());
        assert_eq!(Some(true), cookie.http_only());
        assert_eq!(Some(true), cookie.secure());
        assert_eq!(Some(SameSite::Lax), cookie.same_site());
    }

    #[test]
    fn test_strict_config() {
        let settings = SessionCookie::from_config(&StrictConfig);
        let cookie = settings.build(SessionCookieAction::Issue(Secret::from("abc")));

        assert_eq!("sid", cookie.name());
        assert_eq!(Some(SameSite::Strict), cookie.same_site());
    }

    #[test]
    fn test_revoke_cookie() {
        let settings = SessionCookie::from_config(&DefaultConfig);
        let cookie = settings.build(SessionCookieAction::Revoke);

        assert_eq!("session_id", cookie.name());
        assert_eq!("", cookie.value());
        assert_eq!(Some(actix_web::cookie::time::Duration::ZERO), cookie.max_age());
    }
}
