//! 통화 및 환율 변환
//!
//! 모든 지갑 잔고는 기준 통화(native)로 보관하고, 조회 시 사용자의 표시 통화로 변환합니다.
//! 환율은 고정 테이블을 사용합니다.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// 지원 통화
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Inr, Currency::Usd, Currency::Eur, Currency::Gbp];

    /// 통화 코드
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    /// 1 단위당 INR 환산값
    fn inr_rate(&self) -> Decimal {
        match self {
            Currency::Inr => dec!(1),
            Currency::Usd => dec!(83),
            Currency::Eur => dec!(90),
            Currency::Gbp => dec!(105),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == upper)
            .ok_or_else(|| PlatformError::InvalidRequest(format!("지원하지 않는 통화: {}", s)))
    }
}

/// 금액을 소수점 2자리로 반올림
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 고정 환율 변환기
#[derive(Debug, Clone, Copy)]
pub struct CurrencyConverter {
    native: Currency,
}

impl CurrencyConverter {
    pub fn new(native: Currency) -> Self {
        Self { native }
    }

    /// 기준 통화
    pub fn native(&self) -> Currency {
        self.native
    }

    /// 임의 통화 간 변환
    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Decimal {
        if from == to {
            return round_money(amount);
        }
        round_money(amount * from.inr_rate() / to.inr_rate())
    }

    /// 기준 통화로 변환
    pub fn to_native(&self, amount: Decimal, from: Currency) -> Decimal {
        self.convert(amount, from, self.native)
    }

    /// 기준 통화에서 표시 통화로 변환
    pub fn from_native(&self, amount: Decimal, to: Currency) -> Decimal {
        self.convert(amount, self.native, to)
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(Currency::Inr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_native() {
        let converter = CurrencyConverter::new(Currency::Inr);
        assert_eq!(converter.to_native(dec!(1), Currency::Usd), dec!(83.00));
        assert_eq!(converter.to_native(dec!(2.5), Currency::Gbp), dec!(262.50));
        assert_eq!(converter.to_native(dec!(99.999), Currency::Inr), dec!(100.00));
    }

    #[test]
    fn test_convert_from_native_rounds() {
        let converter = CurrencyConverter::new(Currency::Inr);
        // 100 / 83 = 1.2048...
        assert_eq!(converter.from_native(dec!(100), Currency::Usd), dec!(1.20));
        assert_eq!(converter.from_native(dec!(160), Currency::Eur), dec!(1.78));
    }

    #[test]
    fn test_cross_rate_with_non_inr_native() {
        let converter = CurrencyConverter::new(Currency::Usd);
        assert_eq!(converter.native(), Currency::Usd);
        assert_eq!(converter.to_native(dec!(830), Currency::Inr), dec!(10.00));
        assert_eq!(converter.convert(dec!(105), Currency::Eur, Currency::Gbp), dec!(90.00));
    }

    #[test]
    fn test_parse_currency_code() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" GBP ".parse::<Currency>().unwrap(), Currency::Gbp);
        assert!("XYZ".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_codes() {
        let json = serde_json::to_string(&Currency::Eur).unwrap();
        assert_eq!(json, "\"EUR\"");
        let parsed: Currency = serde_json::from_str("\"INR\"").unwrap();
        assert_eq!(parsed, Currency::Inr);
    }
}
