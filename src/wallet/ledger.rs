//! 지갑 원장 구현
//!
//! 사용자별 지갑과 개발자(플랫폼) 지갑을 메모리에 보관합니다.
//! 모든 잔고 변경은 거래 내역 한 건을 남깁니다.

use std::collections::HashMap;

use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::currency::{round_money, Currency, CurrencyConverter};
use crate::error::{PlatformError, PlatformResult};
use crate::wallet::model::{Transaction, TransactionKind, Wallet, WalletView};

/// 개발자 지갑 ID
pub const DEVELOPER_WALLET_ID: &str = "developer";

const MAX_USERNAME_LEN: usize = 32;

/// 지갑 원장
pub struct WalletLedger {
    /// 사용자 ID → 지갑
    wallets: HashMap<String, Wallet>,
    /// 소문자 사용자명 → 사용자 ID
    usernames: HashMap<String, String>,
    /// 사용자 ID → 거래 내역 (시간순)
    transactions: HashMap<String, Vec<Transaction>>,
    /// 수수료가 쌓이는 플랫폼 지갑
    developer: Wallet,
    converter: CurrencyConverter,
}

impl WalletLedger {
    pub fn new(converter: CurrencyConverter) -> Self {
        let mut transactions = HashMap::new();
        transactions.insert(DEVELOPER_WALLET_ID.to_string(), Vec::new());
        Self {
            wallets: HashMap::new(),
            usernames: HashMap::new(),
            transactions,
            developer: Wallet::new(
                DEVELOPER_WALLET_ID.to_string(),
                DEVELOPER_WALLET_ID.to_string(),
                converter.native(),
            ),
            converter,
        }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// 새 지갑 개설
    pub fn open_wallet(
        &mut self,
        username: &str,
        display_currency: Currency,
    ) -> PlatformResult<Wallet> {
        let username = username.trim();
        if username.is_empty() || username.len() > MAX_USERNAME_LEN {
            return Err(PlatformError::InvalidRequest(format!(
                "사용자명은 1~{}자여야 합니다",
                MAX_USERNAME_LEN
            )));
        }
        let key = username.to_lowercase();
        if key == DEVELOPER_WALLET_ID || self.usernames.contains_key(&key) {
            return Err(PlatformError::UsernameTaken(username.to_string()));
        }

        let user_id = Uuid::new_v4().to_string();
        let wallet = Wallet::new(user_id.clone(), username.to_string(), display_currency);
        self.usernames.insert(key, user_id.clone());
        self.wallets.insert(user_id.clone(), wallet.clone());
        self.transactions.insert(user_id.clone(), Vec::new());

        info!("지갑 개설: {} ({}, {})", username, user_id, display_currency);
        Ok(wallet)
    }

    pub fn get(&self, user_id: &str) -> PlatformResult<&Wallet> {
        self.wallets
            .get(user_id)
            .ok_or_else(|| PlatformError::WalletNotFound(user_id.to_string()))
    }

    /// 표시 통화로 변환된 지갑 조회
    pub fn view(&self, user_id: &str) -> PlatformResult<WalletView> {
        let wallet = self.get(user_id)?;
        let currency = wallet.display_currency;
        Ok(WalletView {
            user_id: wallet.user_id.clone(),
            username: wallet.username.clone(),
            currency,
            balance: self.converter.from_native(wallet.balance, currency),
            held: self.converter.from_native(wallet.held, currency),
            native_currency: self.converter.native(),
            native_balance: wallet.balance,
            native_held: wallet.held,
            updated_at: wallet.updated_at,
        })
    }

    /// 잔고 입금
    pub fn credit(
        &mut self,
        user_id: &str,
        amount: Decimal,
        kind: TransactionKind,
        reference: Option<&str>,
    ) -> PlatformResult<Transaction> {
        let amount = validate_amount(amount)?;
        let wallet = self.user_wallet_mut(user_id)?;
        wallet.balance += amount;
        self.record(user_id, kind, amount, reference)
    }

    /// 잔고를 보류 금액으로 이동
    pub fn hold(
        &mut self,
        user_id: &str,
        amount: Decimal,
        kind: TransactionKind,
        reference: Option<&str>,
    ) -> PlatformResult<Transaction> {
        let amount = validate_amount(amount)?;
        let wallet = self.user_wallet_mut(user_id)?;
        if wallet.balance < amount {
            return Err(PlatformError::InsufficientFunds {
                available: wallet.balance,
                requested: amount,
            });
        }
        wallet.balance -= amount;
        wallet.held += amount;
        self.record(user_id, kind, amount, reference)
    }

    /// 보류 금액을 잔고로 되돌림
    pub fn release(
        &mut self,
        user_id: &str,
        amount: Decimal,
        kind: TransactionKind,
        reference: Option<&str>,
    ) -> PlatformResult<Transaction> {
        let amount = validate_amount(amount)?;
        let wallet = self.user_wallet_mut(user_id)?;
        if wallet.held < amount {
            return Err(held_underflow(user_id, wallet.held, amount));
        }
        wallet.held -= amount;
        wallet.balance += amount;
        self.record(user_id, kind, amount, reference)
    }

    /// 보류 금액을 지갑 밖으로 정산 (출금 완료, 베팅 확정)
    pub fn settle_held(
        &mut self,
        user_id: &str,
        amount: Decimal,
        kind: TransactionKind,
        reference: Option<&str>,
    ) -> PlatformResult<Transaction> {
        let amount = validate_amount(amount)?;
        let wallet = self.user_wallet_mut(user_id)?;
        if wallet.held < amount {
            return Err(held_underflow(user_id, wallet.held, amount));
        }
        wallet.held -= amount;
        self.record(user_id, kind, amount, reference)
    }

    /// 개발자 지갑에 수수료 적립
    pub fn credit_developer(&mut self, amount: Decimal, reference: Option<&str>) -> PlatformResult<Transaction> {
        let amount = validate_amount(amount)?;
        self.developer.balance += amount;
        self.record(DEVELOPER_WALLET_ID, TransactionKind::PlatformFee, amount, reference)
    }

    pub fn developer_wallet(&self) -> &Wallet {
        &self.developer
    }

    /// 최신순 거래 내역
    pub fn transactions(&self, user_id: &str, limit: usize) -> PlatformResult<Vec<Transaction>> {
        let history = self
            .transactions
            .get(user_id)
            .ok_or_else(|| PlatformError::WalletNotFound(user_id.to_string()))?;
        Ok(history.iter().rev().take(limit).cloned().collect())
    }

    pub fn user_count(&self) -> usize {
        self.wallets.len()
    }

    /// 사용자 지갑만 조회 (개발자 지갑은 `credit_developer`로만 변경)
    fn user_wallet_mut(&mut self, user_id: &str) -> PlatformResult<&mut Wallet> {
        self.wallets
            .get_mut(user_id)
            .ok_or_else(|| PlatformError::WalletNotFound(user_id.to_string()))
    }

    fn wallet_mut(&mut self, user_id: &str) -> PlatformResult<&mut Wallet> {
        if user_id == DEVELOPER_WALLET_ID {
            return Ok(&mut self.developer);
        }
        self.wallets
            .get_mut(user_id)
            .ok_or_else(|| PlatformError::WalletNotFound(user_id.to_string()))
    }

    /// 거래 내역 기록 (지갑 변경 직후 호출)
    fn record(
        &mut self,
        user_id: &str,
        kind: TransactionKind,
        amount: Decimal,
        reference: Option<&str>,
    ) -> PlatformResult<Transaction> {
        let now = Utc::now();
        let wallet = self.wallet_mut(user_id)?;
        wallet.updated_at = now;

        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            amount,
            balance_after: wallet.balance,
            held_after: wallet.held,
            reference: reference.map(str::to_string),
            timestamp: now,
        };
        debug!(
            "거래 기록: {} {:?} {} (잔고: {}, 보류: {})",
            user_id, kind, amount, tx.balance_after, tx.held_after
        );
        self.transactions
            .entry(user_id.to_string())
            .or_default()
            .push(tx.clone());
        Ok(tx)
    }
}

fn validate_amount(amount: Decimal) -> PlatformResult<Decimal> {
    let amount = round_money(amount);
    if amount <= Decimal::ZERO {
        return Err(PlatformError::InvalidAmount(format!("금액은 0보다 커야 합니다: {}", amount)));
    }
    Ok(amount)
}

fn held_underflow(user_id: &str, held: Decimal, amount: Decimal) -> PlatformError {
    PlatformError::Internal(format!(
        "보류 금액 부족: {} (보류: {}, 요청: {})",
        user_id, held, amount
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger_with_user(balance: Decimal) -> (WalletLedger, String) {
        let mut ledger = WalletLedger::new(CurrencyConverter::new(Currency::Inr));
        let wallet = ledger.open_wallet("alice", Currency::Usd).unwrap();
        if balance > Decimal::ZERO {
            ledger.credit(&wallet.user_id, balance, TransactionKind::Deposit, None).unwrap();
        }
        (ledger, wallet.user_id)
    }

    #[test]
    fn test_open_wallet_rejects_duplicate_username() {
        let mut ledger = WalletLedger::new(CurrencyConverter::default());
        ledger.open_wallet("Alice", Currency::Inr).unwrap();
        let err = ledger.open_wallet("alice", Currency::Usd).unwrap_err();
        assert!(matches!(err, PlatformError::UsernameTaken(_)));
        assert!(ledger.open_wallet("developer", Currency::Inr).is_err());
        assert!(ledger.open_wallet("   ", Currency::Inr).is_err());
        assert_eq!(ledger.user_count(), 1);
    }

    #[test]
    fn test_hold_and_release() {
        let (mut ledger, user) = ledger_with_user(dec!(500));

        ledger.hold(&user, dec!(200), TransactionKind::WithdrawalHold, Some("w1")).unwrap();
        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(300));
        assert_eq!(wallet.held, dec!(200));

        ledger.release(&user, dec!(200), TransactionKind::WithdrawalRelease, Some("w1")).unwrap();
        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(500));
        assert_eq!(wallet.held, dec!(0));
    }

    #[test]
    fn test_hold_insufficient_funds() {
        let (mut ledger, user) = ledger_with_user(dec!(50));
        let err = ledger.hold(&user, dec!(80), TransactionKind::BetEscrow, None).unwrap_err();
        match err {
            PlatformError::InsufficientFunds { available, requested } => {
                assert_eq!(available, dec!(50));
                assert_eq!(requested, dec!(80));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // 실패한 보류는 잔고를 바꾸지 않음
        assert_eq!(ledger.get(&user).unwrap().balance, dec!(50));
    }

    #[test]
    fn test_settle_held_removes_funds() {
        let (mut ledger, user) = ledger_with_user(dec!(1000));
        ledger.hold(&user, dec!(400), TransactionKind::WithdrawalHold, Some("w1")).unwrap();
        ledger.settle_held(&user, dec!(400), TransactionKind::WithdrawalPayout, Some("w1")).unwrap();

        let wallet = ledger.get(&user).unwrap();
        assert_eq!(wallet.balance, dec!(600));
        assert_eq!(wallet.held, dec!(0));
        assert_eq!(wallet.total(), dec!(600));

        assert!(ledger.settle_held(&user, dec!(1), TransactionKind::WithdrawalPayout, None).is_err());
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let (mut ledger, user) = ledger_with_user(dec!(0));
        assert!(matches!(
            ledger.credit(&user, dec!(0), TransactionKind::Deposit, None),
            Err(PlatformError::InvalidAmount(_))
        ));
        assert!(ledger.credit(&user, dec!(-5), TransactionKind::Deposit, None).is_err());
        assert!(ledger.credit(&user, dec!(0.001), TransactionKind::Deposit, None).is_err());
    }

    #[test]
    fn test_view_converts_to_display_currency() {
        let (ledger, user) = ledger_with_user(dec!(830));
        let view = ledger.view(&user).unwrap();
        assert_eq!(view.currency, Currency::Usd);
        assert_eq!(view.balance, dec!(10.00));
        assert_eq!(view.native_currency, Currency::Inr);
        assert_eq!(view.native_balance, dec!(830));
    }

    #[test]
    fn test_transactions_newest_first() {
        let (mut ledger, user) = ledger_with_user(dec!(100));
        ledger.hold(&user, dec!(30), TransactionKind::BetEscrow, Some("t1")).unwrap();
        ledger.release(&user, dec!(30), TransactionKind::BetRefund, Some("t1")).unwrap();

        let history = ledger.transactions(&user, 10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].kind, TransactionKind::BetRefund);
        assert_eq!(history[2].kind, TransactionKind::Deposit);
        assert_eq!(history[1].held_after, dec!(30));

        assert_eq!(ledger.transactions(&user, 1).unwrap().len(), 1);
        assert!(ledger.transactions("nobody", 10).is_err());
    }

    #[test]
    fn test_developer_wallet_accumulates_fees() {
        let mut ledger = WalletLedger::new(CurrencyConverter::default());
        ledger.credit_developer(dec!(40), Some("m1")).unwrap();
        ledger.credit_developer(dec!(13.33), Some("m2")).unwrap();
        assert_eq!(ledger.developer_wallet().balance, dec!(53.33));
        let history = ledger.transactions(DEVELOPER_WALLET_ID, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|t| t.kind == TransactionKind::PlatformFee));
    }

    #[test]
    fn test_user_operations_cannot_touch_developer_wallet() {
        let mut ledger = WalletLedger::new(CurrencyConverter::default());
        ledger.credit_developer(dec!(40), None).unwrap();

        let err = ledger
            .credit(DEVELOPER_WALLET_ID, dec!(500), TransactionKind::AdminAdjustment, None)
            .unwrap_err();
        assert!(matches!(err, PlatformError::WalletNotFound(_)));
        assert!(matches!(
            ledger.hold(DEVELOPER_WALLET_ID, dec!(10), TransactionKind::BetEscrow, None),
            Err(PlatformError::WalletNotFound(_))
        ));
        assert!(matches!(
            ledger.release(DEVELOPER_WALLET_ID, dec!(10), TransactionKind::BetRefund, None),
            Err(PlatformError::WalletNotFound(_))
        ));
        assert!(matches!(
            ledger.settle_held(DEVELOPER_WALLET_ID, dec!(10), TransactionKind::BetSettled, None),
            Err(PlatformError::WalletNotFound(_))
        ));

        assert_eq!(ledger.developer_wallet().balance, dec!(40));
        assert_eq!(ledger.transactions(DEVELOPER_WALLET_ID, 10).unwrap().len(), 1);
    }
}
