use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::matchmaking::model::{Match, MatchOutcome, Payout};
use crate::wallet::{Transaction, Wallet, WalletView};
use crate::withdrawal::model::{PayoutMethod, Withdrawal, WithdrawalStatus};

/// 회원 가입 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    /// 표시 통화 (기본: 기준 통화)
    pub currency: Option<Currency>,
}

/// 관리자 토큰 발급 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct AdminLoginRequest {
    pub api_key: String,
}

/// 토큰 발급 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// 거래 내역 조회 파라미터
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<usize>,
}

/// 거래 내역 응답
#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub user_id: String,
    pub transactions: Vec<Transaction>,
}

/// 출금 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct WithdrawalRequestBody {
    pub amount: Decimal,
    /// 요청 통화 (기본: 사용자 표시 통화)
    pub currency: Option<Currency>,
    pub method: PayoutMethod,
    pub destination: String,
}

/// 출금 목록 응답
#[derive(Debug, Serialize)]
pub struct WithdrawalListResponse {
    pub withdrawals: Vec<Withdrawal>,
}

/// 출금 목록 조회 파라미터 (관리자)
#[derive(Debug, Deserialize)]
pub struct WithdrawalQuery {
    pub status: Option<String>,
}

/// 관리자 거절 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// 대기열 참가 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct JoinQueueRequest {
    pub game_type: String,
    pub bet: Decimal,
    /// 베팅 통화 (기본: 사용자 표시 통화)
    pub currency: Option<Currency>,
}

/// 점수 보고 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct ScoreRequest {
    pub score: i64,
}

/// 매치 목록 조회 파라미터 (관리자)
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub status: Option<String>,
}

/// 매치 목록 응답
#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<Match>,
}

/// 관리자 입금 요청
#[derive(Debug, Deserialize, Serialize)]
pub struct CreditRequest {
    pub amount: Decimal,
    /// 입금 통화 (기본: 기준 통화)
    pub currency: Option<Currency>,
    pub note: Option<String>,
}

/// 개발자 지갑 응답
#[derive(Debug, Serialize)]
pub struct DeveloperWalletResponse {
    pub wallet: Wallet,
    pub recent_fees: Vec<Transaction>,
}

/// 플랫폼 통계 응답
#[derive(Debug, Serialize)]
pub struct PlatformStatsResponse {
    pub users: usize,
    pub waiting_players: usize,
    pub queue_depths: HashMap<String, usize>,
    pub live_matches: usize,
    pub withdrawals: BTreeMap<String, usize>,
    pub developer_balance: Decimal,
    pub native_currency: Currency,
    pub timestamp: DateTime<Utc>,
}

/// 지갑 응답
pub type WalletResponse = WalletView;

/// WebSocket 메시지 타입
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    /// 매치 성립
    MatchFound {
        match_id: String,
        game_type: String,
        players: Vec<String>,
        bet: Decimal,
        ends_at: DateTime<Utc>,
    },
    /// 실시간 점수 갱신
    ScoreUpdate {
        match_id: String,
        user_id: String,
        score: i64,
        timestamp: DateTime<Utc>,
    },
    /// 매치 정산 완료
    MatchSettled {
        match_id: String,
        outcome: MatchOutcome,
        payout: Option<Payout>,
        timestamp: DateTime<Utc>,
    },
    /// 매치 취소
    MatchCancelled {
        match_id: String,
        timestamp: DateTime<Utc>,
    },
    /// 출금 상태 변경
    WithdrawalUpdate {
        withdrawal_id: String,
        user_id: String,
        status: WithdrawalStatus,
        attempts: u32,
        timestamp: DateTime<Utc>,
    },
    /// 에러 메시지
    Error {
        message: String,
    },
}

/// API 오류 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// 헬스 체크 응답
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
