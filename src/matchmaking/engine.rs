use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::api::models::WebSocketMessage;
use crate::currency::{Currency, CurrencyConverter};
use crate::error::{PlatformError, PlatformResult};
use crate::matchmaking::model::{
  JoinOutcome, Match, MatchOutcome, MatchPlayer, MatchStatus, Payout, PlayerStatus, QueueEntry,
  SettlementReason,
};
use crate::matchmaking::queue::MatchQueue;
use crate::matchmaking::settlement::{determine_outcome, split_pool};
use crate::wallet::{TransactionKind, WalletLedger};

const MAX_GAME_TYPE_LEN: usize = 32;

/// 매치 규칙
#[derive(Debug, Clone)]
pub struct MatchRules {
  /// 최소 베팅 (기준 통화)
  pub min_bet: Decimal,
  /// 최대 베팅 (기준 통화)
  pub max_bet: Decimal,
  /// 매치 제한 시간
  pub duration: chrono::Duration,
  /// 승자 몫 (%)
  pub winner_share_percent: u32,
}

/// 매치메이킹 엔진 구현
///
/// 대기열, 진행 중인 매치, 정산을 관리합니다.
/// 지갑 원장은 호출자가 잠근 뒤 넘겨주며, 잠금 순서는 항상 엔진 → 지갑입니다.
pub struct MatchEngine {
  /// 게임 종류별 대기열
  queue: MatchQueue,
  /// 매치 ID → 매치
  matches: HashMap<String, Match>,
  /// 사용자 ID → 진행 중인 매치 ID
  active_by_user: HashMap<String, String>,
  rules: MatchRules,
  converter: CurrencyConverter,
  /// WebSocket 브로드캐스트 채널
  broadcast_tx: Option<tokio::sync::broadcast::Sender<WebSocketMessage>>,
}

impl MatchEngine {
  /// 새 매치메이킹 엔진 생성
  pub fn new(rules: MatchRules, converter: CurrencyConverter) -> Self {
    MatchEngine {
      queue: MatchQueue::new(),
      matches: HashMap::new(),
      active_by_user: HashMap::new(),
      rules,
      converter,
      broadcast_tx: None,
    }
  }

  pub fn rules(&self) -> &MatchRules {
    &self.rules
  }

  /// WebSocket 브로드캐스트 채널 설정
  pub fn set_broadcast_channel(&mut self, broadcast_tx: tokio::sync::broadcast::Sender<WebSocketMessage>) {
    self.broadcast_tx = Some(broadcast_tx);
  }

  /// 대기열 참가
  ///
  /// 베팅 금액을 에스크로로 보류한 뒤, 같은 게임/같은 금액의 가장 오래된 상대가 있으면
  /// 바로 매치를 시작하고 없으면 대기열 끝에 추가합니다.
  pub fn join(
    &mut self,
    ledger: &mut WalletLedger,
    user_id: &str,
    game_type: &str,
    bet: Decimal,
    currency: Currency,
    now: DateTime<Utc>,
  ) -> PlatformResult<JoinOutcome> {
    let game_type = normalize_game_type(game_type)?;

    if self.queue.is_waiting(user_id) {
      return Err(PlatformError::AlreadyQueued(user_id.to_string()));
    }
    if let Some(match_id) = self.active_by_user.get(user_id) {
      return Err(PlatformError::AlreadyInMatch(match_id.clone()));
    }
    if bet <= Decimal::ZERO {
      return Err(PlatformError::InvalidAmount("베팅 금액은 0보다 커야 합니다".into()));
    }

    let native_bet = self.converter.to_native(bet, currency);
    if native_bet < self.rules.min_bet || native_bet > self.rules.max_bet {
      return Err(PlatformError::InvalidAmount(format!(
        "베팅 금액은 {} ~ {} {} 사이여야 합니다 (요청: {} {})",
        self.rules.min_bet,
        self.rules.max_bet,
        self.converter.native(),
        native_bet,
        self.converter.native()
      )));
    }

    let username = ledger.get(user_id)?.username.clone();
    let ticket_id = Uuid::new_v4().to_string();
    ledger.hold(user_id, native_bet, TransactionKind::BetEscrow, Some(&ticket_id))?;

    let entry = QueueEntry {
      ticket_id,
      user_id: user_id.to_string(),
      username,
      game_type: game_type.clone(),
      bet: native_bet,
      joined_at: now,
    };

    match self.queue.take_opponent(&game_type, native_bet, user_id) {
      Some(opponent) => {
        let game = self.start_match(opponent, entry, now);
        Ok(JoinOutcome::Matched { game })
      }
      None => {
        info!("대기열 참가: {} ({}, 베팅: {})", user_id, game_type, native_bet);
        self.queue.enqueue(entry.clone());
        Ok(JoinOutcome::Queued { entry })
      }
    }
  }

  /// 대기열 이탈 (에스크로 반환)
  pub fn leave(&mut self, ledger: &mut WalletLedger, user_id: &str) -> PlatformResult<QueueEntry> {
    let entry = self
      .queue
      .remove_user(user_id)
      .ok_or_else(|| PlatformError::NotQueued(user_id.to_string()))?;
    ledger.release(user_id, entry.bet, TransactionKind::BetRefund, Some(&entry.ticket_id))?;
    info!("대기열 이탈: {} ({})", user_id, entry.game_type);
    Ok(entry)
  }

  /// 사용자 매치메이킹 상태 조회
  pub fn status(&self, user_id: &str) -> PlayerStatus {
    if let Some(entry) = self.queue.entry_for(user_id) {
      return PlayerStatus::Waiting { entry: entry.clone() };
    }
    match self.active_by_user.get(user_id).and_then(|id| self.matches.get(id)) {
      Some(game) => PlayerStatus::Playing { game: game.clone() },
      None => PlayerStatus::Idle,
    }
  }

  /// 매치 조회
  pub fn get_match(&self, match_id: &str) -> PlatformResult<&Match> {
    self.matches
      .get(match_id)
      .ok_or_else(|| PlatformError::MatchNotFound(match_id.to_string()))
  }

  /// 실시간 점수 보고 (마지막 값으로 갱신)
  pub fn submit_score(
    &mut self,
    match_id: &str,
    user_id: &str,
    score: i64,
    now: DateTime<Utc>,
  ) -> PlatformResult<Match> {
    let game = self
      .matches
      .get_mut(match_id)
      .ok_or_else(|| PlatformError::MatchNotFound(match_id.to_string()))?;
    if !game.has_player(user_id) {
      return Err(PlatformError::NotParticipant(match_id.to_string()));
    }
    if !game.is_live() || game.is_expired(now) {
      return Err(PlatformError::MatchNotActive(match_id.to_string()));
    }

    if let Some(player) = game.players.iter_mut().find(|p| p.user_id == user_id) {
      player.score = Some(score);
    }
    let snapshot = game.clone();

    debug!("점수 갱신: {} {} -> {}", match_id, user_id, score);
    self.broadcast(WebSocketMessage::ScoreUpdate {
      match_id: match_id.to_string(),
      user_id: user_id.to_string(),
      score,
      timestamp: now,
    });
    Ok(snapshot)
  }

  /// 기권 (상대 승리로 정산)
  pub fn forfeit(
    &mut self,
    ledger: &mut WalletLedger,
    match_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
  ) -> PlatformResult<Match> {
    let game = self.live_match(match_id)?;
    let opponent = game
      .opponent_of(user_id)
      .ok_or_else(|| PlatformError::NotParticipant(match_id.to_string()))?
      .to_string();

    info!("기권: {} ({})", user_id, match_id);
    let outcome = MatchOutcome::Win {
      winner: opponent,
      loser: user_id.to_string(),
    };
    self.settle(ledger, match_id, outcome, SettlementReason::Forfeit, now)
  }

  /// 매치 종료 및 정산
  ///
  /// 제한 시간이 지나지 않았으면 `force`가 있어야 종료할 수 있습니다.
  pub fn finish(
    &mut self,
    ledger: &mut WalletLedger,
    match_id: &str,
    now: DateTime<Utc>,
    force: bool,
  ) -> PlatformResult<Match> {
    let game = self.live_match(match_id)?;
    let expired = game.is_expired(now);
    if !expired && !force {
      return Err(PlatformError::MatchNotFinished(match_id.to_string()));
    }

    let outcome = determine_outcome(&game.players);
    let reason = if expired { SettlementReason::TimeUp } else { SettlementReason::Forced };
    self.settle(ledger, match_id, outcome, reason, now)
  }

  /// 관리자 취소 (양쪽 베팅 반환)
  pub fn cancel(&mut self, ledger: &mut WalletLedger, match_id: &str, now: DateTime<Utc>) -> PlatformResult<Match> {
    let game = self.live_match(match_id)?;
    let bet = game.bet;
    let player_ids: Vec<String> = game.players.iter().map(|p| p.user_id.clone()).collect();

    self.ensure_escrow(ledger, &player_ids, bet)?;
    for user_id in &player_ids {
      ledger.release(user_id, bet, TransactionKind::BetRefund, Some(match_id))?;
    }

    let snapshot = {
      let game = self
        .matches
        .get_mut(match_id)
        .ok_or_else(|| PlatformError::MatchNotFound(match_id.to_string()))?;
      game.status = MatchStatus::Cancelled;
      game.settled_at = Some(now);
      game.clone()
    };
    for user_id in &player_ids {
      self.active_by_user.remove(user_id);
    }

    warn!("매치 취소: {}", match_id);
    self.broadcast(WebSocketMessage::MatchCancelled {
      match_id: match_id.to_string(),
      timestamp: now,
    });
    Ok(snapshot)
  }

  /// 제한 시간이 지난 매치 일괄 정산
  pub fn sweep_expired(&mut self, ledger: &mut WalletLedger, now: DateTime<Utc>) -> Vec<Match> {
    let expired: Vec<String> = self
      .matches
      .values()
      .filter(|m| m.is_live() && m.is_expired(now))
      .map(|m| m.id.clone())
      .collect();

    let mut settled = Vec::with_capacity(expired.len());
    for match_id in expired {
      match self.finish(ledger, &match_id, now, false) {
        Ok(game) => settled.push(game),
        Err(e) => error!("만료 매치 정산 실패: {} - {}", match_id, e),
      }
    }
    settled
  }

  /// 매치 목록 (최신순)
  pub fn list_matches(&self, status: Option<MatchStatus>) -> Vec<Match> {
    let mut matches: Vec<Match> = self
      .matches
      .values()
      .filter(|m| status.map_or(true, |s| m.status == s))
      .cloned()
      .collect();
    matches.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    matches
  }

  /// 진행 중인 매치 수
  pub fn live_count(&self) -> usize {
    self.matches.values().filter(|m| m.is_live()).count()
  }

  /// 대기 인원
  pub fn waiting_count(&self) -> usize {
    self.queue.waiting_count()
  }

  /// 게임 종류별 대기 인원
  pub fn queue_depths(&self) -> HashMap<String, usize> {
    self.queue.depths()
  }

  /// 두 대기 항목으로 매치 시작
  fn start_match(&mut self, first: QueueEntry, second: QueueEntry, now: DateTime<Utc>) -> Match {
    let game = Match {
      id: Uuid::new_v4().to_string(),
      game_type: first.game_type.clone(),
      players: vec![
        MatchPlayer { user_id: first.user_id, username: first.username, score: None },
        MatchPlayer { user_id: second.user_id, username: second.username, score: None },
      ],
      bet: first.bet,
      currency: self.converter.native(),
      status: MatchStatus::InProgress,
      started_at: now,
      ends_at: now + self.rules.duration,
      settled_at: None,
      settlement_reason: None,
      outcome: None,
      payout: None,
    };

    for player in &game.players {
      self.active_by_user.insert(player.user_id.clone(), game.id.clone());
    }
    self.matches.insert(game.id.clone(), game.clone());

    info!(
      "매치 성립: {} ({}, {} vs {}, 베팅: {})",
      game.id, game.game_type, game.players[0].user_id, game.players[1].user_id, game.bet
    );
    self.broadcast(WebSocketMessage::MatchFound {
      match_id: game.id.clone(),
      game_type: game.game_type.clone(),
      players: game.players.iter().map(|p| p.user_id.clone()).collect(),
      bet: game.bet,
      ends_at: game.ends_at,
    });
    game
  }

  /// 결과에 따라 에스크로 정산 및 상금 지급
  fn settle(
    &mut self,
    ledger: &mut WalletLedger,
    match_id: &str,
    outcome: MatchOutcome,
    reason: SettlementReason,
    now: DateTime<Utc>,
  ) -> PlatformResult<Match> {
    let game = self.live_match(match_id)?;
    let bet = game.bet;
    let player_ids: Vec<String> = game.players.iter().map(|p| p.user_id.clone()).collect();
    self.ensure_escrow(ledger, &player_ids, bet)?;

    let payout = match &outcome {
      MatchOutcome::Win { winner, loser } => {
        let split = split_pool(bet, self.rules.winner_share_percent);
        ledger.settle_held(winner, bet, TransactionKind::BetSettled, Some(match_id))?;
        ledger.settle_held(loser, bet, TransactionKind::BetSettled, Some(match_id))?;
        ledger.credit(winner, split.winner_amount, TransactionKind::MatchWinnings, Some(match_id))?;
        if split.platform_fee > Decimal::ZERO {
          ledger.credit_developer(split.platform_fee, Some(match_id))?;
        }

        let winner_currency = ledger.get(winner)?.display_currency;
        Some(Payout {
          pool: split.pool,
          winner_amount: split.winner_amount,
          platform_fee: split.platform_fee,
          winner_currency,
          winner_amount_display: self.converter.from_native(split.winner_amount, winner_currency),
        })
      }
      MatchOutcome::Draw => {
        for user_id in &player_ids {
          ledger.release(user_id, bet, TransactionKind::BetRefund, Some(match_id))?;
        }
        None
      }
    };

    let snapshot = {
      let game = self
        .matches
        .get_mut(match_id)
        .ok_or_else(|| PlatformError::MatchNotFound(match_id.to_string()))?;
      game.status = MatchStatus::Completed;
      game.settled_at = Some(now);
      game.settlement_reason = Some(reason);
      game.outcome = Some(outcome.clone());
      game.payout = payout.clone();
      game.clone()
    };
    for user_id in &player_ids {
      self.active_by_user.remove(user_id);
    }

    match &outcome {
      MatchOutcome::Win { winner, .. } => info!("매치 정산: {} 승자 {} ({:?})", match_id, winner, reason),
      MatchOutcome::Draw => info!("매치 정산: {} 무승부 ({:?})", match_id, reason),
    }
    self.broadcast(WebSocketMessage::MatchSettled {
      match_id: match_id.to_string(),
      outcome,
      payout,
      timestamp: now,
    });
    Ok(snapshot)
  }

  fn live_match(&self, match_id: &str) -> PlatformResult<&Match> {
    let game = self.get_match(match_id)?;
    if !game.is_live() {
      return Err(PlatformError::MatchNotActive(match_id.to_string()));
    }
    Ok(game)
  }

  /// 정산 전에 양쪽 에스크로가 모두 남아 있는지 확인
  fn ensure_escrow(&self, ledger: &WalletLedger, player_ids: &[String], bet: Decimal) -> PlatformResult<()> {
    for user_id in player_ids {
      let held = ledger.get(user_id)?.held;
      if held < bet {
        return Err(PlatformError::Internal(format!(
          "에스크로 부족: {} (보류: {}, 베팅: {})",
          user_id, held, bet
        )));
      }
    }
    Ok(())
  }

  /// 매치 이벤트 브로드캐스트
  fn broadcast(&self, message: WebSocketMessage) {
    if let Some(ref broadcast_tx) = self.broadcast_tx {
      if broadcast_tx.send(message).is_err() {
        debug!("매치 이벤트 수신자 없음");
      }
    }
  }
}

/// 게임 종류 키 정규화 (소문자, 영숫자/-/_ 만 허용)
fn normalize_game_type(game_type: &str) -> PlatformResult<String> {
  let key = game_type.trim().to_ascii_lowercase();
  let valid = !key.is_empty()
    && key.len() <= MAX_GAME_TYPE_LEN
    && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
  if !valid {
    return Err(PlatformError::InvalidRequest(format!("잘못된 게임 종류: {}", game_type)));
  }
  Ok(key)
}
