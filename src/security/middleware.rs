use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};

use super::claims::UserContext;
use super::tokens::verify_token;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(|h| h.strip_prefix("Bearer ")) else {
        if state.config.security.jwt_required {
            return Err(StatusCode::UNAUTHORIZED);
        }
        request.extensions_mut().insert(UserContext::anonymous());
        return Ok(next.run(request).await);
    };

    // A token that is present must be valid, required or not
    match verify_token(token, &state.config.security.jwt_secret) {
        Ok(claims) => {
            request.extensions_mut().insert(UserContext::from_claims(claims));
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
