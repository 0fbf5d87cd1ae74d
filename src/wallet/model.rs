//! 지갑 기본 모델
//!
//! 지갑, 거래 내역, 조회용 뷰를 정의합니다.
//! 모든 금액은 기준 통화 기준으로 저장됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// 사용자 지갑
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// 사용자 ID
    pub user_id: String,
    /// 사용자명
    pub username: String,
    /// 표시 통화
    pub display_currency: Currency,
    /// 사용 가능 잔고 (기준 통화)
    pub balance: Decimal,
    /// 보류 금액 (출금 대기, 베팅 에스크로)
    pub held: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: String, username: String, display_currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username,
            display_currency,
            balance: Decimal::ZERO,
            held: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// 보류 금액을 포함한 총액
    pub fn total(&self) -> Decimal {
        self.balance + self.held
    }
}

/// 거래 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    AdminAdjustment,
    WithdrawalHold,
    WithdrawalRelease,
    WithdrawalPayout,
    BetEscrow,
    BetRefund,
    BetSettled,
    MatchWinnings,
    PlatformFee,
}

/// 거래 내역
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    /// 거래 금액 (항상 양수, 방향은 kind로 구분)
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub held_after: Decimal,
    /// 관련 출금/매치/대기열 ID
    pub reference: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// 표시 통화로 변환된 지갑 조회 결과
#[derive(Debug, Clone, Serialize)]
pub struct WalletView {
    pub user_id: String,
    pub username: String,
    pub currency: Currency,
    pub balance: Decimal,
    pub held: Decimal,
    pub native_currency: Currency,
    pub native_balance: Decimal,
    pub native_held: Decimal,
    pub updated_at: DateTime<Utc>,
}
