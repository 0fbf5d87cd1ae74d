use axum::{
    routing::{get, post},
    Router,
};

use crate::api::admin::*;
use crate::api::handlers::*;
use crate::api::websocket::websocket_handler;
use crate::server::ServerState;

/// API 라우터 생성
pub fn create_api_router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_handler))

        // 인증 API
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/admin", post(admin_login))

        // 지갑 API
        .route("/api/v1/wallet", get(get_wallet))
        .route("/api/v1/wallet/transactions", get(get_transactions))

        // 출금 API
        .route("/api/v1/withdrawals", post(request_withdrawal).get(list_my_withdrawals))
        .route("/api/v1/withdrawals/:withdrawal_id", get(get_withdrawal))
        .route("/api/v1/withdrawals/:withdrawal_id/cancel", post(cancel_withdrawal))

        // 매치메이킹 API
        .route("/api/v1/matchmaking/join", post(join_queue))
        .route("/api/v1/matchmaking/leave", post(leave_queue))
        .route("/api/v1/matchmaking/status", get(matchmaking_status))
        .route("/api/v1/matches/:match_id", get(get_match))
        .route("/api/v1/matches/:match_id/score", post(submit_score))
        .route("/api/v1/matches/:match_id/forfeit", post(forfeit_match))

        // 관리자 API
        .route("/api/v1/admin/stats", get(platform_stats))
        .route("/api/v1/admin/withdrawals", get(list_withdrawals))
        .route("/api/v1/admin/withdrawals/:withdrawal_id/approve", post(approve_withdrawal))
        .route("/api/v1/admin/withdrawals/:withdrawal_id/reject", post(reject_withdrawal))
        .route("/api/v1/admin/withdrawals/:withdrawal_id/retry", post(retry_withdrawal))
        .route("/api/v1/admin/wallets/:user_id/credit", post(credit_wallet))
        .route("/api/v1/admin/developer-wallet", get(developer_wallet))
        .route("/api/v1/admin/matches", get(list_matches))
        .route("/api/v1/admin/matches/:match_id/finish", post(finish_match))
        .route("/api/v1/admin/matches/:match_id/cancel", post(cancel_match))
}
