use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::domain::quota::{GuestId, QuotaIdentity};
use crate::infrastructure::config::Config;
use crate::{
    domain::auth::JwtManager, error::AppError, infrastructure::repositories::UserRepository,
};

pub const X_DEVICE_ID: &str = "x-device-id";

/// Whose quota a request spends, injected into request extensions
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: QuotaIdentity,
}

/// Resolves the caller: a bearer token names an account, otherwise the
/// device id header names a guest. Requests with neither are rejected.
pub async fn caller_middleware(
    State((user_repo, config)): State<(Arc<UserRepository>, Arc<Config>)>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    let identity = match auth_header {
        Some(header) => {
            let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                AppError::Unauthorized("Invalid authorization format".to_string())
            })?;

            let jwt_manager =
                JwtManager::new(config.jwt_secret.clone(), config.jwt_expiration_hours);
            let user_id = jwt_manager.extract_user_id(token)?;

            let user = user_repo
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            QuotaIdentity::Account(user.id)
        }
        None => {
            let device_id = request
                .headers()
                .get(X_DEVICE_ID)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    AppError::Unauthorized(
                        "Missing authorization header or device id".to_string(),
                    )
                })?;

            let guest = GuestId::parse(device_id)
                .ok_or_else(|| AppError::BadRequest("Invalid device id".to_string()))?;

            QuotaIdentity::Guest(guest)
        }
    };

    tracing::debug!(identity = %identity, "Caller resolved");
    request.extensions_mut().insert(Caller { identity });

    Ok(next.run(request).await)
}
