use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::api::models::WebSocketMessage;
use crate::server::ServerState;

/// WebSocket 연결 핸들러
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
) -> Response {
    ws.on_upgrade(|socket| websocket_connection(socket, state))
}

/// WebSocket 연결 처리
async fn websocket_connection(
    socket: WebSocket,
    state: ServerState,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.event_tx.subscribe();
    info!("WebSocket 연결 수립");

    // 클라이언트로부터 메시지 수신 처리
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    debug!("WebSocket 메시지 수신: {}", text);
                }
                Message::Close(_) => {
                    info!("WebSocket 연결 종료");
                    break;
                }
                _ => {}
            }
        }
    });

    // 플랫폼 이벤트를 클라이언트로 전송
    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket 수신 지연으로 {}건 누락", skipped);
                    WebSocketMessage::Error {
                        message: format!("{}건의 이벤트가 누락되었습니다", skipped),
                    }
                }
                Err(RecvError::Closed) => break,
            };

            let json_message = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("WebSocket 메시지 직렬화 실패: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json_message)).await.is_err() {
                break;
            }
        }
    });

    // 두 태스크 중 하나라도 완료되면 연결 종료
    tokio::select! {
        _ = recv_task => {},
        _ = send_task => {},
    }
}
