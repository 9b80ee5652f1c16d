use actix_web::{
    http::header,
    web,
    HttpRequest,
    HttpResponse,
};
use serde::Deserialize;

use crate::{
    cookies::{SessionCookie, SessionCookieAction},
    errors::Error,
    secret::Secret,
    service::AuthService,
    store::{CredentialStore, UserRecord},
};

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: Secret,
}

#[derive(Deserialize)]
struct ResetRequest {
    email: String,
}

#[derive(Deserialize)]
struct PasswordUpdate {
    email: String,
    reset_token: Secret,
    new_password: Secret,
}

/// Registers the authentication routes. The application must also register
/// a `web::Data<AuthService<S>>`, which the handlers use.
///
/// ```ignore
/// let auth = web::Data::new(AuthService::new(MemoryStore::new()));
/// App::new()
///     .app_data(auth.clone())
///     .configure(routes::configure::<MemoryStore>(SessionCookie::from_config(&DefaultConfig)))
/// ```
pub fn configure<S: CredentialStore + 'static>(
    cookie: SessionCookie,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(cookie))
            .route("/", web::get().to(index))
            .route("/users", web::post().to(register_user::<S>))
            .route("/profile", web::get().to(profile::<S>))
            .service(
                web::resource("/sessions")
                    .route(web::post().to(login::<S>))
                    .route(web::delete().to(logout::<S>)),
            )
            .service(
                web::resource("/reset_password")
                    .route(web::post().to(get_reset_password_token::<S>))
                    .route(web::put().to(update_password::<S>)),
            );
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .json(serde_json::json!({"message": "Bienvenue"}))
}

async fn register_user<S: CredentialStore + 'static>(
    auth: web::Data<AuthService<S>>,
    form: web::Form<Credentials>,
) -> Result<HttpResponse, Error> {
    let Credentials {email, password} = form.into_inner();
    let user = auth.register_user(&email, password)
        .await?;

    Ok(HttpResponse::Ok()
        .json(serde_json::json!({"email": user.email, "message": "user created"})))
}

async fn login<S: CredentialStore + 'static>(
    auth: web::Data<AuthService<S>>,
    cookie: web::Data<SessionCookie>,
    form: web::Form<Credentials>,
) -> Result<HttpResponse, Error> {
    let Credentials {email, password} = form.into_inner();
    if !auth.valid_login(&email, &password).await {
        return Err(Error::InvalidCredentials);
    }

    let session_id = auth.create_session(&email)
        .await?;

    let mut response = HttpResponse::Ok();
    cookie.apply(SessionCookieAction::Issue(session_id), &mut response);
    Ok(response.json(serde_json::json!({"email": email, "message": "logged in"})))
}

async fn logout<S: CredentialStore + 'static>(
    auth: web::Data<AuthService<S>>,
    cookie: web::Data<SessionCookie>,
    request: HttpRequest,
) -> Result<HttpResponse, Error> {
    let user = require_user(auth.get_ref(), cookie.get_ref(), &request)
        .await?;
    auth.destroy_session(user.id)
        .await;

    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, "/"));
    cookie.apply(SessionCookieAction::Revoke, &mut response);
    Ok(response.finish())
}

async fn profile<S: CredentialStore + 'static>(
    auth: web::Data<AuthService<S>>,
    cookie: web::Data<SessionCookie>,
    request: HttpRequest,
) -> Result<HttpResponse, Error> {
    let user = require_user(auth.get_ref(), cookie.get_ref(), &request)
        .await?;

    Ok(HttpResponse::Ok()
        .json(serde_json::json!({"email": user.email})))
}

async fn get_reset_password_token<S: CredentialStore + 'static>(
    auth: web::Data<AuthService<S>>,
    form: web::Form<ResetRequest>,
) -> Result<HttpResponse, Error> {
    let ResetRequest {email} = form.into_inner();
    let token = auth.get_reset_token(&email)
        .await?;

    Ok(HttpResponse::Ok()
        .json(serde_json::json!({"email": email, "reset_token": token.expose()})))
}

async fn update_password<S: CredentialStore + 'static>(
    auth: web::Data<AuthService<S>>,
    form: web::Form<PasswordUpdate>,
) -> Result<HttpResponse, Error> {
    let PasswordUpdate {email, reset_token, new_password} = form.into_inner();
    auth.update_password(&reset_token, new_password)
        .await?;

    Ok(HttpResponse::Ok()
        .json(serde_json::json!({"email": email, "message": "Password updated"})))
}

/// Gets the user for the request's session cookie, or returns
/// `Error::NotAuthenticated` if there is no cookie or no such session.
async fn require_user<S: CredentialStore + 'static>(
    auth: &AuthService<S>,
    cookie: &SessionCookie,
    request: &HttpRequest,
) -> Result<UserRecord, Error> {
    let session_id = cookie.read(request)
        .ok_or(Error::NotAuthenticated)?;

    auth.get_user_from_session(&session_id)
        .await
        .ok_or(Error::NotAuthenticated)
}
