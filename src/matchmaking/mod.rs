/**
* filename : mod
* author : HAMA
* date: 2025. 6. 2.
* description: 
**/

pub mod model;
pub mod queue;
pub mod settlement;
pub mod engine;

pub use model::{
  JoinOutcome,
  Match,
  MatchOutcome,
  MatchPlayer,
  MatchStatus,
  Payout,
  PlayerStatus,
  QueueEntry,
  SettlementReason,
};

pub use queue::MatchQueue;
pub use settlement::{determine_outcome, split_pool, PoolSplit};
pub use engine::{MatchEngine, MatchRules};
