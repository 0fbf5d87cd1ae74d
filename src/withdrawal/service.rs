//! 출금 상태 머신
//!
//! 출금 요청의 생성, 승인, 게이트웨이 처리, 완료/실패/재시도를 담당합니다.
//! 지갑 원장은 호출자가 잠근 뒤 `&mut WalletLedger`로 넘겨줍니다.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::models::WebSocketMessage;
use crate::currency::{Currency, CurrencyConverter};
use crate::error::{PlatformError, PlatformResult};
use crate::wallet::{TransactionKind, WalletLedger};
use crate::withdrawal::gateway::PayoutJob;
use crate::withdrawal::model::{PayoutMethod, Withdrawal, WithdrawalStatus};

/// 출금 한도 및 재시도 정책
#[derive(Debug, Clone)]
pub struct WithdrawalPolicy {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// 첫 시도 이후 허용되는 재시도 횟수
    pub max_retries: u32,
    /// 재시도 지연 기본값 (시도마다 2배)
    pub retry_base: Duration,
}

/// 출금 서비스
pub struct WithdrawalService {
    /// 출금 ID → 출금 요청
    withdrawals: HashMap<String, Withdrawal>,
    /// 생성 순서
    order: Vec<String>,
    policy: WithdrawalPolicy,
    converter: CurrencyConverter,
    /// WebSocket 브로드캐스트 채널
    broadcast_tx: Option<tokio::sync::broadcast::Sender<WebSocketMessage>>,
}

impl WithdrawalService {
    pub fn new(policy: WithdrawalPolicy, converter: CurrencyConverter) -> Self {
        Self {
            withdrawals: HashMap::new(),
            order: Vec::new(),
            policy,
            converter,
            broadcast_tx: None,
        }
    }

    /// WebSocket 브로드캐스트 채널 설정
    pub fn set_broadcast_channel(&mut self, broadcast_tx: tokio::sync::broadcast::Sender<WebSocketMessage>) {
        self.broadcast_tx = Some(broadcast_tx);
    }

    /// 출금 요청 생성 (금액 보류)
    #[allow(clippy::too_many_arguments)]
    pub fn request(
        &mut self,
        ledger: &mut WalletLedger,
        user_id: &str,
        amount: Decimal,
        currency: Currency,
        method: PayoutMethod,
        destination: &str,
        now: DateTime<Utc>,
    ) -> PlatformResult<Withdrawal> {
        if amount <= Decimal::ZERO {
            return Err(PlatformError::InvalidAmount("출금 금액은 0보다 커야 합니다".into()));
        }
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(PlatformError::InvalidRequest("지급 대상 정보가 필요합니다".into()));
        }

        let native_amount = self.converter.to_native(amount, currency);
        if native_amount < self.policy.min_amount || native_amount > self.policy.max_amount {
            return Err(PlatformError::InvalidAmount(format!(
                "출금 금액은 {} ~ {} {} 사이여야 합니다 (요청: {} {})",
                self.policy.min_amount,
                self.policy.max_amount,
                self.converter.native(),
                native_amount,
                self.converter.native()
            )));
        }

        let id = Uuid::new_v4().to_string();
        ledger.hold(user_id, native_amount, TransactionKind::WithdrawalHold, Some(&id))?;

        let withdrawal = Withdrawal {
            id: id.clone(),
            user_id: user_id.to_string(),
            amount: native_amount,
            requested_amount: amount,
            requested_currency: currency,
            method,
            destination: destination.to_string(),
            status: WithdrawalStatus::PendingApproval,
            attempts: 0,
            last_error: None,
            note: None,
            gateway_reference: None,
            next_attempt_at: None,
            created_at: now,
            updated_at: now,
        };

        info!("출금 요청 생성: {} ({} {}, {})", id, native_amount, self.converter.native(), method.as_str());
        self.withdrawals.insert(id.clone(), withdrawal.clone());
        self.order.push(id);
        self.broadcast_update(&withdrawal);
        Ok(withdrawal)
    }

    /// 관리자 승인
    pub fn approve(&mut self, id: &str, now: DateTime<Utc>) -> PlatformResult<Withdrawal> {
        let withdrawal = self.expect_status(id, WithdrawalStatus::PendingApproval, "approve")?;
        withdrawal.status = WithdrawalStatus::Approved;
        withdrawal.next_attempt_at = None;
        withdrawal.updated_at = now;

        let snapshot = withdrawal.clone();
        info!("출금 승인: {}", id);
        self.broadcast_update(&snapshot);
        Ok(snapshot)
    }

    /// 관리자 거절 (보류 해제)
    pub fn reject(
        &mut self,
        ledger: &mut WalletLedger,
        id: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> PlatformResult<Withdrawal> {
        let withdrawal = self.expect_status(id, WithdrawalStatus::PendingApproval, "reject")?;
        ledger.release(&withdrawal.user_id, withdrawal.amount, TransactionKind::WithdrawalRelease, Some(id))?;
        withdrawal.status = WithdrawalStatus::Rejected;
        withdrawal.note = reason;
        withdrawal.updated_at = now;

        let snapshot = withdrawal.clone();
        info!("출금 거절: {}", id);
        self.broadcast_update(&snapshot);
        Ok(snapshot)
    }

    /// 사용자 취소 (승인 전까지만 가능)
    pub fn cancel(
        &mut self,
        ledger: &mut WalletLedger,
        id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> PlatformResult<Withdrawal> {
        let owner = self.get(id)?.user_id.clone();
        if owner != user_id {
            return Err(PlatformError::Forbidden(format!("본인의 출금 요청만 취소할 수 있습니다: {}", id)));
        }

        let withdrawal = self.expect_status(id, WithdrawalStatus::PendingApproval, "cancel")?;
        ledger.release(&withdrawal.user_id, withdrawal.amount, TransactionKind::WithdrawalRelease, Some(id))?;
        withdrawal.status = WithdrawalStatus::Cancelled;
        withdrawal.updated_at = now;

        let snapshot = withdrawal.clone();
        info!("출금 취소: {}", id);
        self.broadcast_update(&snapshot);
        Ok(snapshot)
    }

    /// 실패한 출금 재시도 (관리자, 금액 재보류)
    pub fn retry(&mut self, ledger: &mut WalletLedger, id: &str, now: DateTime<Utc>) -> PlatformResult<Withdrawal> {
        let withdrawal = self.expect_status(id, WithdrawalStatus::Failed, "retry")?;
        ledger.hold(&withdrawal.user_id, withdrawal.amount, TransactionKind::WithdrawalHold, Some(id))?;
        withdrawal.status = WithdrawalStatus::Approved;
        withdrawal.attempts = 0;
        withdrawal.last_error = None;
        withdrawal.next_attempt_at = None;
        withdrawal.updated_at = now;

        let snapshot = withdrawal.clone();
        info!("출금 재시도 등록: {}", id);
        self.broadcast_update(&snapshot);
        Ok(snapshot)
    }

    /// 처리 시각이 된 승인 건을 처리 중으로 전환하고 지급 작업 반환
    pub fn begin_due(&mut self, now: DateTime<Utc>) -> Vec<PayoutJob> {
        let native = self.converter.native();
        let mut jobs = Vec::new();

        for id in &self.order {
            let Some(withdrawal) = self.withdrawals.get_mut(id) else {
                continue;
            };
            if !withdrawal.is_due(now) {
                continue;
            }

            withdrawal.status = WithdrawalStatus::Processing;
            withdrawal.attempts += 1;
            withdrawal.next_attempt_at = None;
            withdrawal.updated_at = now;

            debug!("출금 처리 시작: {} (시도 {})", id, withdrawal.attempts);
            jobs.push(PayoutJob {
                withdrawal_id: withdrawal.id.clone(),
                user_id: withdrawal.user_id.clone(),
                amount: withdrawal.amount,
                currency: native,
                method: withdrawal.method,
                destination: withdrawal.destination.clone(),
                attempt: withdrawal.attempts,
            });
        }

        for job in &jobs {
            if let Some(withdrawal) = self.withdrawals.get(&job.withdrawal_id) {
                self.broadcast_update(withdrawal);
            }
        }
        jobs
    }

    /// 게이트웨이 성공 처리 (보류 금액 정산)
    pub fn complete(
        &mut self,
        ledger: &mut WalletLedger,
        id: &str,
        reference: String,
        now: DateTime<Utc>,
    ) -> PlatformResult<Withdrawal> {
        let withdrawal = self.expect_status(id, WithdrawalStatus::Processing, "complete")?;
        ledger.settle_held(&withdrawal.user_id, withdrawal.amount, TransactionKind::WithdrawalPayout, Some(id))?;
        withdrawal.status = WithdrawalStatus::Completed;
        withdrawal.gateway_reference = Some(reference);
        withdrawal.last_error = None;
        withdrawal.updated_at = now;

        let snapshot = withdrawal.clone();
        info!("출금 완료: {} ({} 시도)", id, snapshot.attempts);
        self.broadcast_update(&snapshot);
        Ok(snapshot)
    }

    /// 게이트웨이 실패 처리
    ///
    /// 재시도 한도 이내면 지수 백오프 후 다시 승인 상태로 돌리고,
    /// 한도를 넘으면 실패로 확정하고 보류 금액을 돌려줍니다.
    pub fn fail(
        &mut self,
        ledger: &mut WalletLedger,
        id: &str,
        error: String,
        now: DateTime<Utc>,
    ) -> PlatformResult<Withdrawal> {
        let max_retries = self.policy.max_retries;
        let retry_base = self.policy.retry_base;

        let withdrawal = self.expect_status(id, WithdrawalStatus::Processing, "fail")?;
        withdrawal.last_error = Some(error);
        withdrawal.updated_at = now;

        if withdrawal.attempts <= max_retries {
            let delay = retry_delay(retry_base, withdrawal.attempts);
            withdrawal.status = WithdrawalStatus::Approved;
            withdrawal.next_attempt_at = Some(now.checked_add_signed(delay).unwrap_or(now));
            warn!(
                "출금 게이트웨이 실패, 재시도 예약: {} (시도 {}/{}, {}ms 후)",
                id,
                withdrawal.attempts,
                max_retries + 1,
                delay.num_milliseconds()
            );
        } else {
            ledger.release(&withdrawal.user_id, withdrawal.amount, TransactionKind::WithdrawalRelease, Some(id))?;
            withdrawal.status = WithdrawalStatus::Failed;
            withdrawal.next_attempt_at = None;
            warn!("출금 실패 확정: {} ({} 시도)", id, withdrawal.attempts);
        }

        let snapshot = withdrawal.clone();
        self.broadcast_update(&snapshot);
        Ok(snapshot)
    }

    pub fn get(&self, id: &str) -> PlatformResult<&Withdrawal> {
        self.withdrawals
            .get(id)
            .ok_or_else(|| PlatformError::WithdrawalNotFound(id.to_string()))
    }

    /// 사용자별 출금 목록 (최신순)
    pub fn list_for_user(&self, user_id: &str) -> Vec<Withdrawal> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.withdrawals.get(id))
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect()
    }

    /// 상태별 출금 목록 (오래된 순, 관리자 처리 순서)
    pub fn list_by_status(&self, status: Option<WithdrawalStatus>) -> Vec<Withdrawal> {
        self.order
            .iter()
            .filter_map(|id| self.withdrawals.get(id))
            .filter(|w| status.map_or(true, |s| w.status == s))
            .cloned()
            .collect()
    }

    /// 상태별 건수
    pub fn count_by_status(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = WithdrawalStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for withdrawal in self.withdrawals.values() {
            *counts.entry(withdrawal.status.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn expect_status(
        &mut self,
        id: &str,
        expected: WithdrawalStatus,
        action: &'static str,
    ) -> PlatformResult<&mut Withdrawal> {
        let withdrawal = self
            .withdrawals
            .get_mut(id)
            .ok_or_else(|| PlatformError::WithdrawalNotFound(id.to_string()))?;
        if withdrawal.status != expected {
            return Err(PlatformError::InvalidTransition {
                id: id.to_string(),
                from: withdrawal.status.to_string(),
                action,
            });
        }
        Ok(withdrawal)
    }

    /// 출금 상태 변경 브로드캐스트
    fn broadcast_update(&self, withdrawal: &Withdrawal) {
        if let Some(ref broadcast_tx) = self.broadcast_tx {
            let message = WebSocketMessage::WithdrawalUpdate {
                withdrawal_id: withdrawal.id.clone(),
                user_id: withdrawal.user_id.clone(),
                status: withdrawal.status,
                attempts: withdrawal.attempts,
                timestamp: withdrawal.updated_at,
            };
            if broadcast_tx.send(message).is_err() {
                debug!("출금 업데이트 수신자 없음: {}", withdrawal.id);
            }
        }
    }
}

/// 재시도 대기 상한 (하루)
const MAX_RETRY_DELAY_MS: i64 = 86_400_000;

/// n번째 시도 실패 후 대기 시간: base * 2^(n-1), 하루를 넘지 않음
fn retry_delay(base: Duration, attempts: u32) -> chrono::Duration {
    let exponent = attempts.saturating_sub(1).min(16);
    let base_ms = i64::try_from(base.as_millis()).unwrap_or(i64::MAX);
    let millis = base_ms.saturating_mul(1i64 << exponent).min(MAX_RETRY_DELAY_MS);
    chrono::Duration::milliseconds(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn setup(balance: Decimal, max_retries: u32) -> (WithdrawalService, WalletLedger, String) {
        let converter = CurrencyConverter::new(Currency::Inr);
        let mut ledger = WalletLedger::new(converter);
        let wallet = ledger.open_wallet("bob", Currency::Inr).unwrap();
        ledger.credit(&wallet.user_id, balance, TransactionKind::Deposit, None).unwrap();
        let policy = WithdrawalPolicy {
            min_amount: dec!(100),
            max_amount: dec!(10000),
            max_retries,
            retry_base: Duration::from_millis(1000),
        };
        (WithdrawalService::new(policy, converter), ledger, wallet.user_id)
    }

    fn request(service: &mut WithdrawalService, ledger: &mut WalletLedger, user: &str, amount: Decimal) -> Withdrawal {
        service
            .request(ledger, user, amount, Currency::Inr, PayoutMethod::Upi, "bob@upi", Utc::now())
            .unwrap()
    }

    #[test]
    fn test_request_holds_funds() {
        let (mut service, mut ledger, user) = setup(dec!(1000), 3);
        let w = request(&mut service, &mut ledger, &user, dec!(400));

        assert_eq!(w.status, WithdrawalStatus::PendingApproval);
        assert_eq!(w.amount, dec!(400));
        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(600));
        assert_eq!(wallet.held, dec!(400));
    }

    #[test]
    fn test_request_converts_currency_and_checks_limits() {
        let (mut service, mut ledger, user) = setup(dec!(5000), 3);

        // 2 USD = 166 INR
        let w = service
            .request(&mut ledger, &user, dec!(2), Currency::Usd, PayoutMethod::Paypal, "bob@mail.com", Utc::now())
            .unwrap();
        assert_eq!(w.amount, dec!(166.00));
        assert_eq!(w.requested_amount, dec!(2));
        assert_eq!(w.requested_currency, Currency::Usd);

        // 1 USD = 83 INR < 최소 100
        let err = service
            .request(&mut ledger, &user, dec!(1), Currency::Usd, PayoutMethod::Paypal, "bob@mail.com", Utc::now())
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidAmount(_)));

        let err = service
            .request(&mut ledger, &user, dec!(200), Currency::Inr, PayoutMethod::Upi, "  ", Utc::now())
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_insufficient_funds() {
        let (mut service, mut ledger, user) = setup(dec!(150), 3);
        let err = service
            .request(&mut ledger, &user, dec!(200), Currency::Inr, PayoutMethod::Upi, "bob@upi", Utc::now())
            .unwrap_err();
        assert!(matches!(err, PlatformError::InsufficientFunds { .. }));
        assert!(service.list_for_user(&user).is_empty());
    }

    #[test]
    fn test_happy_path_completes_and_settles() {
        let (mut service, mut ledger, user) = setup(dec!(1000), 3);
        let w = request(&mut service, &mut ledger, &user, dec!(300));
        let now = Utc::now();

        service.approve(&w.id, now).unwrap();
        let jobs = service.begin_due(now);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].attempt, 1);
        assert_eq!(service.get(&w.id).unwrap().status, WithdrawalStatus::Processing);

        // 처리 중인 건은 다시 집히지 않음
        assert!(service.begin_due(now).is_empty());

        let done = service.complete(&mut ledger, &w.id, "upi-ref".into(), now).unwrap();
        assert_eq!(done.status, WithdrawalStatus::Completed);
        assert_eq!(done.gateway_reference.as_deref(), Some("upi-ref"));

        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(700));
        assert_eq!(wallet.held, dec!(0));
    }

    #[test]
    fn test_pending_cannot_be_processed_before_approval() {
        let (mut service, mut ledger, user) = setup(dec!(1000), 3);
        let w = request(&mut service, &mut ledger, &user, dec!(300));
        assert!(service.begin_due(Utc::now()).is_empty());

        let err = service.complete(&mut ledger, &w.id, "ref".into(), Utc::now()).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidTransition { action: "complete", .. }));
    }

    #[test]
    fn test_reject_and_cancel_release_funds() {
        let (mut service, mut ledger, user) = setup(dec!(1000), 3);
        let w1 = request(&mut service, &mut ledger, &user, dec!(300));
        let w2 = request(&mut service, &mut ledger, &user, dec!(200));
        assert_eq!(ledger.get(&user).unwrap().balance, dec!(500));

        let rejected = service.reject(&mut ledger, &w1.id, Some("KYC 미완료".into()), Utc::now()).unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(rejected.note.as_deref(), Some("KYC 미완료"));

        let err = service.cancel(&mut ledger, &w2.id, "someone-else", Utc::now()).unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden(_)));
        let cancelled = service.cancel(&mut ledger, &w2.id, &user, Utc::now()).unwrap();
        assert_eq!(cancelled.status, WithdrawalStatus::Cancelled);

        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(1000));
        assert_eq!(wallet.held, dec!(0));

        // 종료 상태에서는 다시 승인할 수 없음
        assert!(service.approve(&w1.id, Utc::now()).is_err());
        assert!(service.cancel(&mut ledger, &w2.id, &user, Utc::now()).is_err());
    }

    #[test]
    fn test_failure_schedules_exponential_retry() {
        let (mut service, mut ledger, user) = setup(dec!(1000), 3);
        let w = request(&mut service, &mut ledger, &user, dec!(300));
        let t0 = Utc::now();
        service.approve(&w.id, t0).unwrap();

        service.begin_due(t0);
        let after_first = service.fail(&mut ledger, &w.id, "timeout".into(), t0).unwrap();
        assert_eq!(after_first.status, WithdrawalStatus::Approved);
        assert_eq!(after_first.next_attempt_at, Some(t0 + chrono::Duration::milliseconds(1000)));
        assert_eq!(after_first.last_error.as_deref(), Some("timeout"));

        // 대기 시간 전에는 처리하지 않음
        assert!(service.begin_due(t0 + chrono::Duration::milliseconds(999)).is_empty());

        let t1 = t0 + chrono::Duration::milliseconds(1000);
        let jobs = service.begin_due(t1);
        assert_eq!(jobs[0].attempt, 2);
        let after_second = service.fail(&mut ledger, &w.id, "timeout".into(), t1).unwrap();
        assert_eq!(after_second.next_attempt_at, Some(t1 + chrono::Duration::milliseconds(2000)));

        // 재시도 중에도 금액은 보류 상태
        assert_eq!(ledger.get(&user).unwrap().held, dec!(300));
    }

    #[test]
    fn test_failure_after_max_retries_releases_funds() {
        let (mut service, mut ledger, user) = setup(dec!(1000), 1);
        let w = request(&mut service, &mut ledger, &user, dec!(300));
        let mut now = Utc::now();
        service.approve(&w.id, now).unwrap();

        // 시도 1: 재시도 예약
        service.begin_due(now);
        service.fail(&mut ledger, &w.id, "declined".into(), now).unwrap();
        now = now + chrono::Duration::seconds(5);

        // 시도 2: 한도 초과로 실패 확정
        service.begin_due(now);
        let failed = service.fail(&mut ledger, &w.id, "declined".into(), now).unwrap();
        assert_eq!(failed.status, WithdrawalStatus::Failed);
        assert_eq!(failed.attempts, 2);

        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(1000));
        assert_eq!(wallet.held, dec!(0));

        // 관리자 재시도: 금액 재보류 후 승인 상태로
        let retried = service.retry(&mut ledger, &w.id, now).unwrap();
        assert_eq!(retried.status, WithdrawalStatus::Approved);
        assert_eq!(retried.attempts, 0);
        assert_eq!(ledger.get(&user).unwrap().held, dec!(300));
    }

    #[test]
    fn test_retry_requires_funds() {
        let (mut service, mut ledger, user) = setup(dec!(300), 0);
        let w = request(&mut service, &mut ledger, &user, dec!(300));
        let now = Utc::now();
        service.approve(&w.id, now).unwrap();
        service.begin_due(now);
        service.fail(&mut ledger, &w.id, "declined".into(), now).unwrap();

        // 돌려받은 금액을 다른 곳에 묶어둠
        ledger.hold(&user, dec!(250), TransactionKind::BetEscrow, None).unwrap();
        let err = service.retry(&mut ledger, &w.id, now).unwrap_err();
        assert!(matches!(err, PlatformError::InsufficientFunds { .. }));
        assert_eq!(service.get(&w.id).unwrap().status, WithdrawalStatus::Failed);
    }

    #[test]
    fn test_listing_and_counts() {
        let (mut service, mut ledger, user) = setup(dec!(2000), 3);
        let w1 = request(&mut service, &mut ledger, &user, dec!(100));
        let w2 = request(&mut service, &mut ledger, &user, dec!(200));
        service.approve(&w2.id, Utc::now()).unwrap();

        let mine = service.list_for_user(&user);
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, w2.id);

        let pending = service.list_by_status(Some(WithdrawalStatus::PendingApproval));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, w1.id);
        assert_eq!(service.list_by_status(None).len(), 2);

        let counts = service.count_by_status();
        assert_eq!(counts["pending_approval"], 1);
        assert_eq!(counts["approved"], 1);
        assert_eq!(counts["failed"], 0);
    }

    #[test]
    fn test_retry_delay_doubles() {
        let base = Duration::from_millis(500);
        assert_eq!(retry_delay(base, 1).num_milliseconds(), 500);
        assert_eq!(retry_delay(base, 2).num_milliseconds(), 1000);
        assert_eq!(retry_delay(base, 4).num_milliseconds(), 4000);
    }

    #[test]
    fn test_huge_retry_base_is_capped() {
        assert_eq!(retry_delay(Duration::MAX, 1).num_milliseconds(), MAX_RETRY_DELAY_MS);
        assert_eq!(retry_delay(Duration::from_secs(3600), 16).num_milliseconds(), MAX_RETRY_DELAY_MS);

        let (mut service, mut ledger, user) = setup(dec!(1000), 3);
        service.policy.retry_base = Duration::MAX;
        let w = request(&mut service, &mut ledger, &user, dec!(200));
        let now = Utc::now();
        service.approve(&w.id, now).unwrap();
        service.begin_due(now);

        let failed = service.fail(&mut ledger, &w.id, "timeout".into(), now).unwrap();
        assert_eq!(failed.status, WithdrawalStatus::Approved);
        assert_eq!(failed.next_attempt_at, Some(now + chrono::Duration::milliseconds(MAX_RETRY_DELAY_MS)));
    }
}
