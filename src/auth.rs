//! JWT 인증
//!
//! HS256 bearer 토큰을 발급하고 요청 헤더에서 사용자/관리자를 확인합니다.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{PlatformError, PlatformResult};

/// 관리자 토큰의 subject
pub const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub admin: bool,
    pub exp: i64,
    pub jti: String,
}

/// 인증된 요청자
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
}

/// 접근 토큰 발급
pub fn issue_token(
    config: &ServerConfig,
    user_id: &str,
    username: &str,
    admin: bool,
    now: DateTime<Utc>,
) -> PlatformResult<(String, DateTime<Utc>)> {
    let expires_at = now + Duration::minutes(config.token_ttl_minutes);
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        admin,
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok((token, expires_at))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// 요청 헤더의 토큰 검증
pub fn auth_user(config: &ServerConfig, headers: &HeaderMap) -> PlatformResult<AuthUser> {
    let token = bearer_token(headers).ok_or_else(|| PlatformError::Unauthorized("토큰이 없습니다".into()))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| PlatformError::Unauthorized(format!("유효하지 않은 토큰: {}", e)))?;

    Ok(AuthUser {
        user_id: decoded.claims.sub,
        username: decoded.claims.username,
        is_admin: decoded.claims.admin,
    })
}

/// 관리자 토큰 검증
pub fn admin_user(config: &ServerConfig, headers: &HeaderMap) -> PlatformResult<AuthUser> {
    let user = auth_user(config, headers)?;
    if !user.is_admin {
        return Err(PlatformError::Forbidden("관리자 전용 기능입니다".into()));
    }
    Ok(user)
}
