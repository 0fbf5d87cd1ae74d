//! skillpay
//!
//! 스킬 게임 플랫폼 서버: 지갑, 출금 상태 머신, 게임별 매치메이킹과 상금 정산을
//! REST/WebSocket으로 제공합니다.

pub mod api;
pub mod auth;
pub mod config;
pub mod currency;
pub mod error;
pub mod matchmaking;
pub mod server;
pub mod wallet;
pub mod withdrawal;

pub use config::ServerConfig;
pub use error::{PlatformError, PlatformResult};
pub use server::{build_router, build_state, spawn_background_tasks, start_server, ServerState};
