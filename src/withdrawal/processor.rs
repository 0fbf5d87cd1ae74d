//! 출금 처리기
//!
//! 주기적으로 처리 시각이 된 승인 건을 꺼내 게이트웨이로 보내고,
//! 결과에 따라 완료 또는 실패(재시도) 처리합니다.
//! 게이트웨이 호출 중에는 어떤 잠금도 잡지 않습니다.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{error, info};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::wallet::WalletLedger;
use crate::withdrawal::gateway::{PaymentGateway, PayoutJob};
use crate::withdrawal::service::WithdrawalService;

/// 처리 대상 출금을 게이트웨이로 보냄
///
/// 각 지급은 별도 태스크에서 실행되며, 생성된 태스크 핸들을 반환합니다.
pub async fn dispatch_due_withdrawals(
    withdrawals: &Arc<Mutex<WithdrawalService>>,
    wallets: &Arc<Mutex<WalletLedger>>,
    gateway: &Arc<dyn PaymentGateway>,
) -> Vec<JoinHandle<()>> {
    let jobs = {
        let mut service = withdrawals.lock().await;
        service.begin_due(Utc::now())
    };

    jobs.into_iter()
        .map(|job| {
            let withdrawals = withdrawals.clone();
            let wallets = wallets.clone();
            let gateway = gateway.clone();
            tokio::spawn(async move {
                execute_payout(job, withdrawals, wallets, gateway).await;
            })
        })
        .collect()
}

async fn execute_payout(
    job: PayoutJob,
    withdrawals: Arc<Mutex<WithdrawalService>>,
    wallets: Arc<Mutex<WalletLedger>>,
    gateway: Arc<dyn PaymentGateway>,
) {
    let result = gateway.payout(&job).await;

    // 잠금 순서: 출금 서비스 → 지갑
    let mut service = withdrawals.lock().await;
    let mut ledger = wallets.lock().await;
    let now = Utc::now();

    let outcome = match result {
        Ok(reference) => service.complete(&mut ledger, &job.withdrawal_id, reference, now),
        Err(e) => service.fail(&mut ledger, &job.withdrawal_id, e.to_string(), now),
    };

    if let Err(e) = outcome {
        error!("출금 결과 반영 실패: {} - {}", job.withdrawal_id, e);
    }
}

/// 출금 처리 루프
pub async fn run_withdrawal_processor(
    withdrawals: Arc<Mutex<WithdrawalService>>,
    wallets: Arc<Mutex<WalletLedger>>,
    gateway: Arc<dyn PaymentGateway>,
    interval: Duration,
) {
    info!("출금 처리기 시작 (게이트웨이: {}, 주기: {}ms)", gateway.name(), interval.as_millis());
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        dispatch_due_withdrawals(&withdrawals, &wallets, &gateway).await;
    }
}
