//! 승패 판정과 상금 분배 계산

use rust_decimal::Decimal;

use crate::currency::round_money;
use crate::matchmaking::model::{MatchOutcome, MatchPlayer};

/// 점수 비교로 승패 판정
///
/// 점수가 높은 쪽이 승리합니다. 점수를 보고하지 않은 참가자는 보고한 참가자보다 낮게 취급하고,
/// 점수가 같거나 둘 다 보고하지 않았으면 무승부입니다.
pub fn determine_outcome(players: &[MatchPlayer]) -> MatchOutcome {
  let (first, second) = match players {
    [first, second] => (first, second),
    _ => return MatchOutcome::Draw,
  };

  match first.score.cmp(&second.score) {
    std::cmp::Ordering::Greater => MatchOutcome::Win {
      winner: first.user_id.clone(),
      loser: second.user_id.clone(),
    },
    std::cmp::Ordering::Less => MatchOutcome::Win {
      winner: second.user_id.clone(),
      loser: first.user_id.clone(),
    },
    std::cmp::Ordering::Equal => MatchOutcome::Draw,
  }
}

/// 베팅 풀 분배 결과 (기준 통화)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSplit {
  pub pool: Decimal,
  pub winner_amount: Decimal,
  pub platform_fee: Decimal,
}

/// 1인당 베팅 금액으로 풀을 만들고 승자/플랫폼 몫으로 나눔
///
/// 승자 몫을 반올림한 뒤 나머지를 수수료로 잡아 합계가 항상 풀과 같습니다.
pub fn split_pool(bet: Decimal, winner_share_percent: u32) -> PoolSplit {
  let pool = round_money(bet * Decimal::from(2));
  let winner_amount = round_money(pool * Decimal::from(winner_share_percent) / Decimal::from(100));
  PoolSplit {
    pool,
    winner_amount,
    platform_fee: pool - winner_amount,
  }
}
