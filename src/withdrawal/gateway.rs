//! 결제 게이트웨이 연동
//!
//! 실제 지급은 `PaymentGateway` 구현체가 담당합니다.
//! 기본 구현인 `SimulatedGateway`는 지연과 실패 확률만 흉내냅니다.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::currency::Currency;
use crate::error::{PlatformError, PlatformResult};
use crate::withdrawal::model::PayoutMethod;

/// 게이트웨이로 보낼 지급 작업
#[derive(Debug, Clone)]
pub struct PayoutJob {
    pub withdrawal_id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PayoutMethod,
    pub destination: String,
    /// 이번 시도 번호 (1부터)
    pub attempt: u32,
}

/// 결제 게이트웨이
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &str;

    /// 지급 실행, 성공 시 게이트웨이 참조번호 반환
    async fn payout(&self, job: &PayoutJob) -> PlatformResult<String>;
}

/// 지연/실패 확률 기반 게이트웨이
pub struct SimulatedGateway {
    delay: Duration,
    failure_rate: f64,
}

impl SimulatedGateway {
    pub fn new(delay: Duration, failure_rate: f64) -> Self {
        Self {
            delay,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn payout(&self, job: &PayoutJob) -> PlatformResult<String> {
        let failed = rand::thread_rng().gen_bool(self.failure_rate);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if failed {
            warn!(
                "게이트웨이 지급 실패: {} ({} {}, 시도 {})",
                job.withdrawal_id, job.amount, job.currency, job.attempt
            );
            return Err(PlatformError::Gateway(format!(
                "{} 지급이 거절되었습니다",
                job.method.as_str()
            )));
        }

        let reference = format!("{}-{}", job.method.as_str(), Uuid::new_v4().simple());
        debug!("게이트웨이 지급 성공: {} -> {}", job.withdrawal_id, reference);
        Ok(reference)
    }
}
