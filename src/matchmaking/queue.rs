//! 게임 종류별 대기열 구현
//!
//! 게임 종류마다 FIFO 대기열을 두고, 같은 베팅 금액의 가장 오래된 상대를 찾아 짝을 짓습니다.

use std::collections::{HashMap, VecDeque};

use log::debug;
use rust_decimal::Decimal;

use crate::matchmaking::model::QueueEntry;

/// 매치 대기열
#[derive(Debug, Default)]
pub struct MatchQueue {
  /// 게임 종류 → 대기 항목 (시간 우선순위)
  queues: HashMap<String, VecDeque<QueueEntry>>,
  /// 사용자 ID → 대기 중인 게임 종류
  waiting: HashMap<String, String>,
}

impl MatchQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// 대기열 끝에 추가
  pub fn enqueue(&mut self, entry: QueueEntry) {
    debug!("대기열 추가: {} ({}, 베팅: {})", entry.user_id, entry.game_type, entry.bet);
    self.waiting.insert(entry.user_id.clone(), entry.game_type.clone());
    self.queues
      .entry(entry.game_type.clone())
      .or_default()
      .push_back(entry);
  }

  /// 같은 게임, 같은 베팅 금액의 가장 오래된 상대를 꺼냄
  pub fn take_opponent(&mut self, game_type: &str, bet: Decimal, user_id: &str) -> Option<QueueEntry> {
    let queue = self.queues.get_mut(game_type)?;
    let position = queue
      .iter()
      .position(|entry| entry.bet == bet && entry.user_id != user_id)?;
    let entry = queue.remove(position)?;

    if queue.is_empty() {
      self.queues.remove(game_type);
    }
    self.waiting.remove(&entry.user_id);
    Some(entry)
  }

  /// 사용자의 대기 항목 제거
  pub fn remove_user(&mut self, user_id: &str) -> Option<QueueEntry> {
    let game_type = self.waiting.remove(user_id)?;
    let queue = self.queues.get_mut(&game_type)?;
    let position = queue.iter().position(|entry| entry.user_id == user_id)?;
    let entry = queue.remove(position);

    if queue.is_empty() {
      self.queues.remove(&game_type);
    }
    entry
  }

  /// 사용자의 대기 항목 조회
  pub fn entry_for(&self, user_id: &str) -> Option<&QueueEntry> {
    let game_type = self.waiting.get(user_id)?;
    self.queues
      .get(game_type)?
      .iter()
      .find(|entry| entry.user_id == user_id)
  }

  pub fn is_waiting(&self, user_id: &str) -> bool {
    self.waiting.contains_key(user_id)
  }

  /// 전체 대기 인원
  pub fn waiting_count(&self) -> usize {
    self.waiting.len()
  }

  /// 게임 종류별 대기 인원
  pub fn depth(&self, game_type: &str) -> usize {
    self.queues.get(game_type).map_or(0, |q| q.len())
  }

  /// 게임 종류별 대기 인원 목록
  pub fn depths(&self) -> HashMap<String, usize> {
    self.queues
      .iter()
      .map(|(game_type, queue)| (game_type.clone(), queue.len()))
      .collect()
  }
}
