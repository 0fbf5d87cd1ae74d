//! 관리자 전용 핸들러

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
};
use chrono::Utc;
use log::info;

use crate::api::models::*;
use crate::auth::admin_user;
use crate::error::{PlatformError, PlatformResult};
use crate::matchmaking::{Match, MatchStatus};
use crate::server::ServerState;
use crate::wallet::{TransactionKind, DEVELOPER_WALLET_ID};
use crate::withdrawal::{Withdrawal, WithdrawalStatus};

const RECENT_FEE_LIMIT: usize = 20;

/// 플랫폼 통계
pub async fn platform_stats(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<PlatformStatsResponse>> {
    admin_user(&state.config, &headers)?;

    let (waiting_players, queue_depths, live_matches) = {
        let engine = state.matches.lock().await;
        (engine.waiting_count(), engine.queue_depths(), engine.live_count())
    };
    let withdrawals = state.withdrawals.lock().await.count_by_status();
    let ledger = state.wallets.lock().await;

    Ok(Json(PlatformStatsResponse {
        users: ledger.user_count(),
        waiting_players,
        queue_depths,
        live_matches,
        withdrawals,
        developer_balance: ledger.developer_wallet().balance,
        native_currency: ledger.converter().native(),
        timestamp: Utc::now(),
    }))
}

/// 출금 목록 (상태 필터)
pub async fn list_withdrawals(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<WithdrawalQuery>,
) -> PlatformResult<Json<WithdrawalListResponse>> {
    admin_user(&state.config, &headers)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<WithdrawalStatus>)
        .transpose()
        .map_err(PlatformError::InvalidRequest)?;

    let service = state.withdrawals.lock().await;
    Ok(Json(WithdrawalListResponse {
        withdrawals: service.list_by_status(status),
    }))
}

/// 출금 승인
pub async fn approve_withdrawal(
    Path(withdrawal_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Withdrawal>> {
    admin_user(&state.config, &headers)?;
    let mut service = state.withdrawals.lock().await;
    Ok(Json(service.approve(&withdrawal_id, Utc::now())?))
}

/// 출금 거절
pub async fn reject_withdrawal(
    Path(withdrawal_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
    payload: Option<Json<RejectRequest>>,
) -> PlatformResult<Json<Withdrawal>> {
    admin_user(&state.config, &headers)?;
    let reason = payload.and_then(|Json(body)| body.reason);

    let mut service = state.withdrawals.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(service.reject(&mut ledger, &withdrawal_id, reason, Utc::now())?))
}

/// 실패한 출금 재시도
pub async fn retry_withdrawal(
    Path(withdrawal_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Withdrawal>> {
    admin_user(&state.config, &headers)?;
    let mut service = state.withdrawals.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(service.retry(&mut ledger, &withdrawal_id, Utc::now())?))
}

/// 사용자 지갑 입금 (관리자 조정)
pub async fn credit_wallet(
    Path(user_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<CreditRequest>,
) -> PlatformResult<Json<WalletResponse>> {
    admin_user(&state.config, &headers)?;

    let mut ledger = state.wallets.lock().await;
    let converter = *ledger.converter();
    let currency = payload.currency.unwrap_or(converter.native());
    let amount = converter.to_native(payload.amount, currency);

    ledger.credit(&user_id, amount, TransactionKind::AdminAdjustment, payload.note.as_deref())?;
    info!("관리자 입금: {} ({} {})", user_id, amount, converter.native());
    Ok(Json(ledger.view(&user_id)?))
}

/// 개발자 지갑 조회
pub async fn developer_wallet(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<DeveloperWalletResponse>> {
    admin_user(&state.config, &headers)?;
    let ledger = state.wallets.lock().await;
    Ok(Json(DeveloperWalletResponse {
        wallet: ledger.developer_wallet().clone(),
        recent_fees: ledger.transactions(DEVELOPER_WALLET_ID, RECENT_FEE_LIMIT)?,
    }))
}

/// 매치 목록 (상태 필터)
pub async fn list_matches(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<MatchQuery>,
) -> PlatformResult<Json<MatchListResponse>> {
    admin_user(&state.config, &headers)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<MatchStatus>)
        .transpose()
        .map_err(PlatformError::InvalidRequest)?;

    let engine = state.matches.lock().await;
    Ok(Json(MatchListResponse {
        matches: engine.list_matches(status),
    }))
}

/// 매치 강제 종료 및 정산
pub async fn finish_match(
    Path(match_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Match>> {
    admin_user(&state.config, &headers)?;
    let mut engine = state.matches.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(engine.finish(&mut ledger, &match_id, Utc::now(), true)?))
}

/// 매치 취소 (베팅 반환)
pub async fn cancel_match(
    Path(match_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Match>> {
    admin_user(&state.config, &headers)?;
    let mut engine = state.matches.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(engine.cancel(&mut ledger, &match_id, Utc::now())?))
}
