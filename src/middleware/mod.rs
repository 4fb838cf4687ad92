use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

use crate::error::AppError;
use crate::models::Admin;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub admin_id: i32,
    pub email: String,
}

impl AdminUser {
    // Используется, когда авторизация выключена флагом
    fn anonymous() -> Self {
        AdminUser {
            admin_id: 0,
            email: "anonymous".to_string(),
        }
    }
}

/// Разбирает заголовок `Authorization: Basic ...` в пару email/пароль.
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (email, password) = credentials.split_once(':')?;
    if email.is_empty() {
        return None;
    }
    Some((email.to_string(), password.to_string()))
}

// Отпечаток для ключа кеша, сам пароль в Redis не попадает
fn credential_fingerprint(email: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(email.as_bytes())
        .chain_update(b":")
        .chain_update(password.as_bytes())
        .finalize();
    general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

// Basic Auth extractor для админских ручек
impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !cfg!(feature = "auth") || !state.config.features.enable_auth {
            return Ok(AdminUser::anonymous());
        }

        let (email, password) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic_auth)
            .ok_or(AppError::Unauthorized)?;

        let fingerprint = credential_fingerprint(&email, &password);

        // Сначала кеш, чтобы не гонять bcrypt на каждый запрос
        match state.cache.get_cached_admin(&email, &fingerprint).await {
            Ok(Some(cached)) => {
                if let Ok(admin) = serde_json::from_str::<AdminUser>(&cached) {
                    return Ok(admin);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Auth cache read failed: {}", e),
        }

        let admin = Admin::find_active_by_email(&email, &state.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        // bcrypt тяжёлый, уводим с рантайма
        let verified = {
            let admin = admin.clone();
            tokio::task::spawn_blocking(move || admin.verify_password(&password))
                .await
                .map_err(|e| AppError::Internal(format!("password check panicked: {e}")))?
        };
        if !verified {
            warn!("Rejected admin login for {}", email);
            return Err(AppError::Unauthorized);
        }

        let user = AdminUser {
            admin_id: admin.id,
            email: admin.email,
        };

        if let Ok(data) = serde_json::to_string(&user) {
            if let Err(e) = state.cache.cache_admin(&email, &fingerprint, &data).await {
                warn!("Failed to cache admin auth: {}", e);
            }
        }

        Ok(user)
    }
}
