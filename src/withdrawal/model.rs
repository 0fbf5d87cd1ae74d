//! 출금 요청 모델
//!
//! 출금 요청의 상태와 상태 전이 규칙을 정의합니다.
//!
//! ```text
//! PendingApproval ─approve─▶ Approved ─pick─▶ Processing ─ok─▶ Completed
//!        │                      ▲                  │
//!        ├─reject─▶ Rejected    └──── 재시도 ──────┤
//!        └─cancel─▶ Cancelled                      └─한도 초과─▶ Failed ─retry─▶ Approved
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// 출금 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// 관리자 승인 대기
    PendingApproval,
    /// 승인됨, 게이트웨이 처리 대기
    Approved,
    /// 게이트웨이 처리 중
    Processing,
    /// 지급 완료
    Completed,
    /// 재시도 한도 초과로 실패
    Failed,
    /// 관리자 거절
    Rejected,
    /// 사용자 취소
    Cancelled,
}

impl WithdrawalStatus {
    pub const ALL: [WithdrawalStatus; 7] = [
        WithdrawalStatus::PendingApproval,
        WithdrawalStatus::Approved,
        WithdrawalStatus::Processing,
        WithdrawalStatus::Completed,
        WithdrawalStatus::Failed,
        WithdrawalStatus::Rejected,
        WithdrawalStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::PendingApproval => "pending_approval",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Failed => "failed",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Cancelled => "cancelled",
        }
    }

    /// 더 이상 자동으로 진행되지 않는 상태
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::Completed
                | WithdrawalStatus::Failed
                | WithdrawalStatus::Rejected
                | WithdrawalStatus::Cancelled
        )
    }

    /// 보류 금액이 아직 지갑에 묶여 있는 상태
    pub fn holds_funds(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::PendingApproval | WithdrawalStatus::Approved | WithdrawalStatus::Processing
        )
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WithdrawalStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("알 수 없는 출금 상태: {}", s))
    }
}

/// 지급 수단
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    BankTransfer,
    Upi,
    Paypal,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMethod::BankTransfer => "bank_transfer",
            PayoutMethod::Upi => "upi",
            PayoutMethod::Paypal => "paypal",
        }
    }
}

/// 출금 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    /// 출금 고유 ID
    pub id: String,
    /// 요청 사용자 ID
    pub user_id: String,
    /// 출금 금액 (기준 통화)
    pub amount: Decimal,
    /// 사용자가 요청한 금액
    pub requested_amount: Decimal,
    /// 사용자가 요청한 통화
    pub requested_currency: Currency,
    pub method: PayoutMethod,
    /// 계좌번호, UPI ID, 이메일 등
    pub destination: String,
    pub status: WithdrawalStatus,
    /// 게이트웨이 시도 횟수
    pub attempts: u32,
    pub last_error: Option<String>,
    /// 거절 사유 등 관리자 메모
    pub note: Option<String>,
    pub gateway_reference: Option<String>,
    /// 다음 게이트웨이 시도 가능 시각 (재시도 대기)
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Withdrawal {
    /// 게이트웨이 처리 대상인지 확인
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == WithdrawalStatus::Approved && self.next_attempt_at.map_or(true, |at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        for status in WithdrawalStatus::ALL {
            assert_eq!(status.as_str().parse::<WithdrawalStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<WithdrawalStatus>().is_err());
    }

    #[test]
    fn test_terminal_and_holding_states_are_disjoint() {
        for status in WithdrawalStatus::ALL {
            assert_ne!(status.is_terminal(), status.holds_funds(), "{}", status);
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&WithdrawalStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");
    }
}
