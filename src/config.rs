//! 서버 설정
//!
//! `.env` 파일과 환경 변수에서 설정을 읽고, 없는 값은 기본값을 사용합니다.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::currency::Currency;

/// 매치 제한 시간 상한 (하루)
pub const MAX_MATCH_DURATION_SECS: i64 = 86_400;
/// 출금 재시도 기본 대기 상한 (한 시간)
pub const MAX_RETRY_BASE_MS: u64 = 3_600_000;
/// 토큰 유효 시간 상한 (30일)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 43_200;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rest_port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub admin_api_key: String,
    pub native_currency: Currency,
    pub match_duration_secs: i64,
    pub min_bet: Decimal,
    pub max_bet: Decimal,
    pub winner_share_percent: u32,
    pub min_withdrawal: Decimal,
    pub max_withdrawal: Decimal,
    pub withdrawal_max_retries: u32,
    pub withdrawal_retry_base_ms: u64,
    pub gateway_delay_ms: u64,
    pub gateway_failure_rate: f64,
    pub sweep_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rest_port: 7000,
            jwt_secret: "skillpay-dev-secret".into(),
            token_ttl_minutes: 720,
            admin_api_key: "skillpay-dev-admin".into(),
            native_currency: Currency::Inr,
            match_duration_secs: 300,
            min_bet: dec!(10),
            max_bet: dec!(10000),
            winner_share_percent: 80,
            min_withdrawal: dec!(100),
            max_withdrawal: dec!(100000),
            withdrawal_max_retries: 3,
            withdrawal_retry_base_ms: 2000,
            gateway_delay_ms: 1500,
            gateway_failure_rate: 0.1,
            sweep_interval_ms: 1000,
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let cfg = Self {
            rest_port: env_or("REST_PORT", defaults.rest_port)?,
            jwt_secret: env_or("JWT_SECRET", defaults.jwt_secret)?,
            token_ttl_minutes: env_or("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes)?,
            admin_api_key: env_or("ADMIN_API_KEY", defaults.admin_api_key)?,
            native_currency: env_or("NATIVE_CURRENCY", defaults.native_currency)?,
            match_duration_secs: env_or("MATCH_DURATION_SECS", defaults.match_duration_secs)?,
            min_bet: env_or("MIN_BET", defaults.min_bet)?,
            max_bet: env_or("MAX_BET", defaults.max_bet)?,
            winner_share_percent: env_or("WINNER_SHARE_PERCENT", defaults.winner_share_percent)?,
            min_withdrawal: env_or("MIN_WITHDRAWAL", defaults.min_withdrawal)?,
            max_withdrawal: env_or("MAX_WITHDRAWAL", defaults.max_withdrawal)?,
            withdrawal_max_retries: env_or("WITHDRAWAL_MAX_RETRIES", defaults.withdrawal_max_retries)?,
            withdrawal_retry_base_ms: env_or("WITHDRAWAL_RETRY_BASE_MS", defaults.withdrawal_retry_base_ms)?,
            gateway_delay_ms: env_or("GATEWAY_DELAY_MS", defaults.gateway_delay_ms)?,
            gateway_failure_rate: env_or("GATEWAY_FAILURE_RATE", defaults.gateway_failure_rate)?,
            sweep_interval_ms: env_or("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<()> {
        if self.winner_share_percent == 0 || self.winner_share_percent > 100 {
            return Err(anyhow!("WINNER_SHARE_PERCENT는 1~100 사이여야 합니다"));
        }
        if self.min_bet <= Decimal::ZERO || self.min_bet > self.max_bet {
            return Err(anyhow!("베팅 한도가 올바르지 않습니다: {} ~ {}", self.min_bet, self.max_bet));
        }
        if self.min_withdrawal <= Decimal::ZERO || self.min_withdrawal > self.max_withdrawal {
            return Err(anyhow!(
                "출금 한도가 올바르지 않습니다: {} ~ {}",
                self.min_withdrawal,
                self.max_withdrawal
            ));
        }
        if !(0.0..=1.0).contains(&self.gateway_failure_rate) {
            return Err(anyhow!("GATEWAY_FAILURE_RATE는 0~1 사이여야 합니다"));
        }
        if self.match_duration_secs <= 0 || self.match_duration_secs > MAX_MATCH_DURATION_SECS {
            return Err(anyhow!("MATCH_DURATION_SECS는 1~{} 사이여야 합니다", MAX_MATCH_DURATION_SECS));
        }
        if self.withdrawal_retry_base_ms > MAX_RETRY_BASE_MS {
            return Err(anyhow!("WITHDRAWAL_RETRY_BASE_MS는 {} 이하여야 합니다", MAX_RETRY_BASE_MS));
        }
        if self.token_ttl_minutes <= 0 || self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(anyhow!("TOKEN_TTL_MINUTES는 1~{} 사이여야 합니다", MAX_TOKEN_TTL_MINUTES));
        }
        if self.jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET이 비어 있습니다"));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(10))
    }

    pub fn gateway_delay(&self) -> Duration {
        Duration::from_millis(self.gateway_delay_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("환경 변수 {} 값이 올바르지 않습니다: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = ServerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.winner_share_percent, 80);
        assert_eq!(cfg.native_currency, Currency::Inr);
    }

    #[test]
    fn test_invalid_share_rejected() {
        let cfg = ServerConfig { winner_share_percent: 120, ..ServerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_bet_bounds_rejected() {
        let cfg = ServerConfig { min_bet: dec!(500), max_bet: dec!(100), ..ServerConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let cfg = ServerConfig { match_duration_secs: i64::MAX, ..ServerConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = ServerConfig { withdrawal_retry_base_ms: u64::MAX, ..ServerConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = ServerConfig { token_ttl_minutes: i64::MAX, ..ServerConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = ServerConfig { match_duration_secs: MAX_MATCH_DURATION_SECS, ..ServerConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_or_parses_and_falls_back() {
        std::env::set_var("SKILLPAY_TEST_PORT", "9100");
        assert_eq!(env_or("SKILLPAY_TEST_PORT", 7000u16).unwrap(), 9100);
        assert_eq!(env_or("SKILLPAY_TEST_MISSING", 7000u16).unwrap(), 7000);
        std::env::set_var("SKILLPAY_TEST_BAD", "not-a-number");
        assert!(env_or("SKILLPAY_TEST_BAD", 1u32).is_err());
    }
}
