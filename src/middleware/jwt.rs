use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::utils::{error::AppError, session::verify_token};

/// Authenticate the request and stash the verified claims in the request
/// extensions. Mobile clients send `Authorization: Bearer <token>`; the
/// `token` cookie is also accepted so browser `EventSource` clients can
/// reach the SSE route.
pub async fn jwt_auth(
    cookie_jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    let token = bearer
        .or_else(|| cookie_jar.get("token").map(|cookie| cookie.value().to_string()))
        .ok_or_else(|| AppError::AuthenticationError("No token found".to_string()))?;

    let claims = verify_token(&token)
        .map_err(|_| AppError::AuthenticationError("Invalid or expired token".to_string()))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
