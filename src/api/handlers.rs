use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use log::info;

use crate::api::models::*;
use crate::auth::{auth_user, issue_token, ADMIN_SUBJECT};
use crate::error::{PlatformError, PlatformResult};
use crate::matchmaking::{JoinOutcome, Match, PlayerStatus, QueueEntry};
use crate::server::ServerState;
use crate::withdrawal::Withdrawal;

const DEFAULT_TRANSACTION_LIMIT: usize = 50;
const MAX_TRANSACTION_LIMIT: usize = 500;

/// 헬스 체크
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// 회원 가입 (지갑 개설 + 토큰 발급)
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> PlatformResult<(StatusCode, Json<AuthResponse>)> {
    let wallet = {
        let mut ledger = state.wallets.lock().await;
        let currency = payload.currency.unwrap_or(state.config.native_currency);
        ledger.open_wallet(&payload.username, currency)?
    };

    let (token, expires_at) = issue_token(&state.config, &wallet.user_id, &wallet.username, false, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user_id: wallet.user_id,
            username: wallet.username,
            expires_at,
        }),
    ))
}

/// 관리자 키로 관리자 토큰 발급
pub async fn admin_login(
    State(state): State<ServerState>,
    Json(payload): Json<AdminLoginRequest>,
) -> PlatformResult<Json<AuthResponse>> {
    if payload.api_key != state.config.admin_api_key {
        return Err(PlatformError::Unauthorized("관리자 키가 올바르지 않습니다".into()));
    }

    let (token, expires_at) = issue_token(&state.config, ADMIN_SUBJECT, ADMIN_SUBJECT, true, Utc::now())?;
    info!("관리자 토큰 발급");
    Ok(Json(AuthResponse {
        token,
        user_id: ADMIN_SUBJECT.to_string(),
        username: ADMIN_SUBJECT.to_string(),
        expires_at,
    }))
}

/// 내 지갑 조회
pub async fn get_wallet(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<WalletResponse>> {
    let user = auth_user(&state.config, &headers)?;
    let ledger = state.wallets.lock().await;
    Ok(Json(ledger.view(&user.user_id)?))
}

/// 내 거래 내역 조회 (최신순)
pub async fn get_transactions(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<TransactionQuery>,
) -> PlatformResult<Json<TransactionsResponse>> {
    let user = auth_user(&state.config, &headers)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, MAX_TRANSACTION_LIMIT);

    let ledger = state.wallets.lock().await;
    let transactions = ledger.transactions(&user.user_id, limit)?;
    Ok(Json(TransactionsResponse {
        user_id: user.user_id,
        transactions,
    }))
}

/// 출금 요청
pub async fn request_withdrawal(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<WithdrawalRequestBody>,
) -> PlatformResult<(StatusCode, Json<Withdrawal>)> {
    let user = auth_user(&state.config, &headers)?;

    // 잠금 순서: 출금 서비스 → 지갑
    let mut service = state.withdrawals.lock().await;
    let mut ledger = state.wallets.lock().await;
    let currency = match payload.currency {
        Some(currency) => currency,
        None => ledger.get(&user.user_id)?.display_currency,
    };

    let withdrawal = service.request(
        &mut ledger,
        &user.user_id,
        payload.amount,
        currency,
        payload.method,
        &payload.destination,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// 내 출금 목록
pub async fn list_my_withdrawals(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<WithdrawalListResponse>> {
    let user = auth_user(&state.config, &headers)?;
    let service = state.withdrawals.lock().await;
    Ok(Json(WithdrawalListResponse {
        withdrawals: service.list_for_user(&user.user_id),
    }))
}

/// 출금 상세 조회 (본인 또는 관리자)
pub async fn get_withdrawal(
    Path(withdrawal_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Withdrawal>> {
    let user = auth_user(&state.config, &headers)?;
    let service = state.withdrawals.lock().await;
    let withdrawal = service.get(&withdrawal_id)?;
    if !user.is_admin && withdrawal.user_id != user.user_id {
        return Err(PlatformError::Forbidden("다른 사용자의 출금 요청입니다".into()));
    }
    Ok(Json(withdrawal.clone()))
}

/// 출금 취소 (승인 전, 본인만)
pub async fn cancel_withdrawal(
    Path(withdrawal_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Withdrawal>> {
    let user = auth_user(&state.config, &headers)?;
    let mut service = state.withdrawals.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(service.cancel(&mut ledger, &withdrawal_id, &user.user_id, Utc::now())?))
}

/// 대기열 참가
pub async fn join_queue(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<JoinQueueRequest>,
) -> PlatformResult<Json<JoinOutcome>> {
    let user = auth_user(&state.config, &headers)?;

    // 잠금 순서: 매치 엔진 → 지갑
    let mut engine = state.matches.lock().await;
    let mut ledger = state.wallets.lock().await;
    let currency = match payload.currency {
        Some(currency) => currency,
        None => ledger.get(&user.user_id)?.display_currency,
    };

    let outcome = engine.join(
        &mut ledger,
        &user.user_id,
        &payload.game_type,
        payload.bet,
        currency,
        Utc::now(),
    )?;
    Ok(Json(outcome))
}

/// 대기열 이탈
pub async fn leave_queue(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<QueueEntry>> {
    let user = auth_user(&state.config, &headers)?;
    let mut engine = state.matches.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(engine.leave(&mut ledger, &user.user_id)?))
}

/// 내 매치메이킹 상태
pub async fn matchmaking_status(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<PlayerStatus>> {
    let user = auth_user(&state.config, &headers)?;
    let engine = state.matches.lock().await;
    Ok(Json(engine.status(&user.user_id)))
}

/// 매치 조회
pub async fn get_match(
    Path(match_id): Path<String>,
    State(state): State<ServerState>,
) -> PlatformResult<Json<Match>> {
    let engine = state.matches.lock().await;
    Ok(Json(engine.get_match(&match_id)?.clone()))
}

/// 점수 보고
pub async fn submit_score(
    Path(match_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(payload): Json<ScoreRequest>,
) -> PlatformResult<Json<Match>> {
    let user = auth_user(&state.config, &headers)?;
    let mut engine = state.matches.lock().await;
    Ok(Json(engine.submit_score(&match_id, &user.user_id, payload.score, Utc::now())?))
}

/// 기권
pub async fn forfeit_match(
    Path(match_id): Path<String>,
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> PlatformResult<Json<Match>> {
    let user = auth_user(&state.config, &headers)?;
    let mut engine = state.matches.lock().await;
    let mut ledger = state.wallets.lock().await;
    Ok(Json(engine.forfeit(&mut ledger, &match_id, &user.user_id, Utc::now())?))
}
