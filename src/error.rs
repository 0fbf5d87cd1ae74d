//! 플랫폼 공통 오류 정의
//!
//! 도메인 계층(지갑, 출금, 매치)에서 발생하는 모든 오류를 하나의 열거형으로 모으고,
//! REST 응답으로 변환하는 규칙을 정의합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::api::models::ErrorResponse;

/// 플랫폼 오류
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("인증이 필요합니다: {0}")]
    Unauthorized(String),

    #[error("권한이 없습니다: {0}")]
    Forbidden(String),

    #[error("잘못된 금액: {0}")]
    InvalidAmount(String),

    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),

    #[error("이미 사용 중인 사용자명: {0}")]
    UsernameTaken(String),

    #[error("지갑을 찾을 수 없음: {0}")]
    WalletNotFound(String),

    #[error("잔고 부족 (사용 가능: {available}, 요청: {requested})")]
    InsufficientFunds { available: Decimal, requested: Decimal },

    #[error("출금 요청을 찾을 수 없음: {0}")]
    WithdrawalNotFound(String),

    #[error("출금 {id}: {from} 상태에서 {action} 불가")]
    InvalidTransition {
        id: String,
        from: String,
        action: &'static str,
    },

    #[error("이미 대기열에 있음: {0}")]
    AlreadyQueued(String),

    #[error("대기열에 없음: {0}")]
    NotQueued(String),

    #[error("이미 진행 중인 매치가 있음: {0}")]
    AlreadyInMatch(String),

    #[error("매치를 찾을 수 없음: {0}")]
    MatchNotFound(String),

    #[error("매치 참가자가 아님: {0}")]
    NotParticipant(String),

    #[error("진행 중인 매치가 아님: {0}")]
    MatchNotActive(String),

    #[error("매치 시간이 아직 끝나지 않음: {0}")]
    MatchNotFinished(String),

    #[error("결제 게이트웨이 오류: {0}")]
    Gateway(String),

    #[error("내부 오류: {0}")]
    Internal(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

impl PlatformError {
    /// 응답 본문에 들어갈 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            PlatformError::Unauthorized(_) => "UNAUTHORIZED",
            PlatformError::Forbidden(_) => "FORBIDDEN",
            PlatformError::InvalidAmount(_) => "INVALID_AMOUNT",
            PlatformError::InvalidRequest(_) => "INVALID_REQUEST",
            PlatformError::UsernameTaken(_) => "USERNAME_TAKEN",
            PlatformError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            PlatformError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            PlatformError::WithdrawalNotFound(_) => "WITHDRAWAL_NOT_FOUND",
            PlatformError::InvalidTransition { .. } => "INVALID_TRANSITION",
            PlatformError::AlreadyQueued(_) => "ALREADY_QUEUED",
            PlatformError::NotQueued(_) => "NOT_QUEUED",
            PlatformError::AlreadyInMatch(_) => "ALREADY_IN_MATCH",
            PlatformError::MatchNotFound(_) => "MATCH_NOT_FOUND",
            PlatformError::NotParticipant(_) => "NOT_PARTICIPANT",
            PlatformError::MatchNotActive(_) => "MATCH_NOT_ACTIVE",
            PlatformError::MatchNotFinished(_) => "MATCH_NOT_FINISHED",
            PlatformError::Gateway(_) => "GATEWAY_ERROR",
            PlatformError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑
    pub fn status(&self) -> StatusCode {
        match self {
            PlatformError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PlatformError::Forbidden(_) | PlatformError::NotParticipant(_) => StatusCode::FORBIDDEN,
            PlatformError::InvalidAmount(_)
            | PlatformError::InvalidRequest(_)
            | PlatformError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            PlatformError::WalletNotFound(_)
            | PlatformError::WithdrawalNotFound(_)
            | PlatformError::NotQueued(_)
            | PlatformError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            PlatformError::UsernameTaken(_)
            | PlatformError::InvalidTransition { .. }
            | PlatformError::AlreadyQueued(_)
            | PlatformError::AlreadyInMatch(_)
            | PlatformError::MatchNotActive(_)
            | PlatformError::MatchNotFinished(_) => StatusCode::CONFLICT,
            PlatformError::Gateway(_) => StatusCode::BAD_GATEWAY,
            PlatformError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for PlatformError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        PlatformError::Internal(format!("토큰 처리 실패: {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PlatformError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(PlatformError::NotParticipant("m".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(PlatformError::MatchNotFound("m".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            PlatformError::InvalidTransition { id: "w".into(), from: "completed".into(), action: "approve" }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(PlatformError::Gateway("down".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = PlatformError::InsufficientFunds { available: dec!(10.00), requested: dec!(25.50) };
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert!(err.to_string().contains("25.50"));
    }
}
