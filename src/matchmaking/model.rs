//! 매치메이킹 기본 모델
//!
//! 이 모듈은 대기열 항목, 매치, 매치 결과, 정산 내역 등
//! 매치메이킹 엔진의 핵심 데이터 모델을 정의합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// 대기열 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
  /// 대기 티켓 ID (에스크로 참조용)
  pub ticket_id: String,
  /// 사용자 ID
  pub user_id: String,
  /// 사용자명
  pub username: String,
  /// 게임 종류 (소문자 키)
  pub game_type: String,
  /// 베팅 금액 (기준 통화)
  pub bet: Decimal,
  /// 대기 시작 시간
  pub joined_at: DateTime<Utc>,
}

/// 매치 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
  /// 진행 중
  InProgress,
  /// 정산 완료
  Completed,
  /// 관리자 취소 (베팅 반환)
  Cancelled,
}

impl std::str::FromStr for MatchStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "in_progress" => Ok(MatchStatus::InProgress),
      "completed" => Ok(MatchStatus::Completed),
      "cancelled" => Ok(MatchStatus::Cancelled),
      other => Err(format!("알 수 없는 매치 상태: {}", other)),
    }
  }
}

/// 매치 참가자
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPlayer {
  pub user_id: String,
  pub username: String,
  /// 마지막으로 보고된 점수 (보고 전에는 없음)
  pub score: Option<i64>,
}

/// 매치 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchOutcome {
  /// 승패 결정
  Win { winner: String, loser: String },
  /// 무승부 (베팅 반환)
  Draw,
}

/// 매치 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementReason {
  /// 제한 시간 종료
  TimeUp,
  /// 관리자 강제 종료
  Forced,
  /// 기권
  Forfeit,
}

/// 승자 정산 내역
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
  /// 총 베팅 풀 (기준 통화)
  pub pool: Decimal,
  /// 승자 지급액 (기준 통화)
  pub winner_amount: Decimal,
  /// 플랫폼 수수료 (기준 통화)
  pub platform_fee: Decimal,
  /// 승자 표시 통화
  pub winner_currency: Currency,
  /// 승자 표시 통화 기준 지급액
  pub winner_amount_display: Decimal,
}

/// 2인 매치
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
  /// 매치 고유 ID
  pub id: String,
  /// 게임 종류
  pub game_type: String,
  /// 참가자 (먼저 대기한 사용자가 첫 번째)
  pub players: Vec<MatchPlayer>,
  /// 1인당 베팅 금액 (기준 통화)
  pub bet: Decimal,
  /// 기준 통화
  pub currency: Currency,
  pub status: MatchStatus,
  pub started_at: DateTime<Utc>,
  /// 점수 제출 마감 시간
  pub ends_at: DateTime<Utc>,
  pub settled_at: Option<DateTime<Utc>>,
  pub settlement_reason: Option<SettlementReason>,
  pub outcome: Option<MatchOutcome>,
  pub payout: Option<Payout>,
}

impl Match {
  /// 참가 여부 확인
  pub fn has_player(&self, user_id: &str) -> bool {
    self.players.iter().any(|p| p.user_id == user_id)
  }

  /// 상대 참가자 ID
  pub fn opponent_of(&self, user_id: &str) -> Option<&str> {
    if !self.has_player(user_id) {
      return None;
    }
    self.players
      .iter()
      .find(|p| p.user_id != user_id)
      .map(|p| p.user_id.as_str())
  }

  /// 제한 시간이 지났는지 확인
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now >= self.ends_at
  }

  pub fn is_live(&self) -> bool {
    self.status == MatchStatus::InProgress
  }
}

/// 대기열 참가 결과
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JoinOutcome {
  /// 상대가 없어 대기열에 추가됨
  Queued { entry: QueueEntry },
  /// 대기 중이던 상대와 매치 성립
  Matched {
    #[serde(rename = "match")]
    game: Match,
  },
}

/// 사용자 매치메이킹 상태
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerStatus {
  Idle,
  Waiting { entry: QueueEntry },
  Playing {
    #[serde(rename = "match")]
    game: Match,
  },
}
