use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use chrono::Utc;
use log::{info, warn};
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::api::models::WebSocketMessage;
use crate::config::{ServerConfig, MAX_MATCH_DURATION_SECS};
use crate::currency::CurrencyConverter;
use crate::matchmaking::{MatchEngine, MatchRules};
use crate::wallet::WalletLedger;
use crate::withdrawal::{run_withdrawal_processor, PaymentGateway, SimulatedGateway, WithdrawalPolicy, WithdrawalService};

/// 서버 상태
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub wallets: Arc<Mutex<WalletLedger>>,
    pub withdrawals: Arc<Mutex<WithdrawalService>>,
    pub matches: Arc<Mutex<MatchEngine>>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub event_tx: broadcast::Sender<WebSocketMessage>,
}

impl ServerState {
    /// 설정과 결제 게이트웨이로 서버 상태 생성
    pub fn new(config: ServerConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        let converter = CurrencyConverter::new(config.native_currency);

        // 브로드캐스트 채널 생성 (WebSocket용)
        let (event_tx, _event_rx) = broadcast::channel(1000);

        let wallets = WalletLedger::new(converter);

        let policy = WithdrawalPolicy {
            min_amount: config.min_withdrawal,
            max_amount: config.max_withdrawal,
            max_retries: config.withdrawal_max_retries,
            retry_base: Duration::from_millis(config.withdrawal_retry_base_ms),
        };
        let mut withdrawals = WithdrawalService::new(policy, converter);
        withdrawals.set_broadcast_channel(event_tx.clone());

        let rules = MatchRules {
            min_bet: config.min_bet,
            max_bet: config.max_bet,
            duration: chrono::Duration::seconds(config.match_duration_secs.clamp(1, MAX_MATCH_DURATION_SECS)),
            winner_share_percent: config.winner_share_percent,
        };
        let mut matches = MatchEngine::new(rules, converter);
        matches.set_broadcast_channel(event_tx.clone());

        Self {
            config: Arc::new(config),
            wallets: Arc::new(Mutex::new(wallets)),
            withdrawals: Arc::new(Mutex::new(withdrawals)),
            matches: Arc::new(Mutex::new(matches)),
            gateway,
            event_tx,
        }
    }
}

/// 설정값으로 시뮬레이션 게이트웨이를 붙인 서버 상태 생성
pub fn build_state(config: ServerConfig) -> ServerState {
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(SimulatedGateway::new(config.gateway_delay(), config.gateway_failure_rate));
    ServerState::new(config, gateway)
}

/// REST/WebSocket 라우터 생성
pub fn build_router(state: ServerState) -> Router {
    create_api_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// 만료 매치 정산 루프
pub async fn run_match_sweeper(
    matches: Arc<Mutex<MatchEngine>>,
    wallets: Arc<Mutex<WalletLedger>>,
    interval: Duration,
) {
    info!("매치 만료 정산기 시작 (주기: {}ms)", interval.as_millis());
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        // 잠금 순서: 매치 엔진 → 지갑
        let mut engine = matches.lock().await;
        let mut ledger = wallets.lock().await;
        let settled = engine.sweep_expired(&mut ledger, Utc::now());
        if !settled.is_empty() {
            info!("만료 매치 {}건 정산", settled.len());
        }
    }
}

/// 백그라운드 작업 시작 (매치 정산, 출금 처리)
pub fn spawn_background_tasks(state: &ServerState) -> Vec<JoinHandle<()>> {
    let interval = state.config.sweep_interval();

    let sweeper = tokio::spawn(run_match_sweeper(
        state.matches.clone(),
        state.wallets.clone(),
        interval,
    ));

    let processor = tokio::spawn(run_withdrawal_processor(
        state.withdrawals.clone(),
        state.wallets.clone(),
        state.gateway.clone(),
        interval,
    ));

    vec![sweeper, processor]
}

/// 서버 시작
pub async fn start_server(config: ServerConfig) -> Result<()> {
    info!("skillpay 서버 시작 중...");
    let port = config.rest_port;

    let state = build_state(config);
    let tasks = spawn_background_tasks(&state);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("서버가 성공적으로 시작되었습니다!");
    info!("REST API: http://localhost:{}", port);
    info!("WebSocket: ws://localhost:{}/ws", port);

    let result = axum::serve(listener, app).await;

    for task in tasks {
        task.abort();
    }
    if let Err(ref e) = result {
        warn!("서버 종료: {}", e);
    }
    Ok(result?)
}
