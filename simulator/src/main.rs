use std::time::Duration;

use log::{info, warn};
use rand::{seq::SliceRandom, thread_rng, Rng};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time;
use uuid::Uuid;

const GAME_TYPES: [&str; 3] = ["chess", "ludo", "carrom"];
const BETS: [u32; 3] = [50, 100, 250];
const CURRENCIES: [&str; 4] = ["INR", "USD", "EUR", "GBP"];

#[derive(Debug, Clone)]
struct Player {
    username: String,
    user_id: String,
    token: String,
}

#[derive(Debug, Clone)]
struct SimConfig {
    api_base_url: String,
    admin_api_key: String,
    players: usize,
    funding: u32,
}

impl SimConfig {
    fn from_env() -> Self {
        Self {
            api_base_url: std::env::var("SKILLPAY_URL").unwrap_or_else(|_| "http://localhost:7000".into()),
            admin_api_key: std::env::var("ADMIN_API_KEY").unwrap_or_else(|_| "skillpay-dev-admin".into()),
            players: std::env::var("SIM_PLAYERS").ok().and_then(|v| v.parse().ok()).unwrap_or(6),
            funding: 5000,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // 로깅 초기화
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("skillpay 시뮬레이션 프로그램 시작");

    let config = SimConfig::from_env();
    let client = Client::new();

    let admin_token = admin_login(&client, &config).await?;

    // 플레이어 등록 및 입금
    let run_id = Uuid::new_v4().simple().to_string();
    let mut players = Vec::with_capacity(config.players);
    for i in 0..config.players {
        let username = format!("sim{}_{}", &run_id[..6], i);
        let currency = *CURRENCIES.choose(&mut thread_rng()).unwrap_or(&"INR");
        let player = register(&client, &config.api_base_url, &username, currency).await?;
        credit(&client, &config.api_base_url, &admin_token, &player.user_id, config.funding).await?;
        info!("플레이어 준비: {} ({}, {} INR)", player.username, currency, config.funding);
        players.push(player);
    }

    let mut handles = Vec::new();

    for player in players {
        let client = client.clone();
        let base_url = config.api_base_url.clone();
        handles.push(tokio::spawn(async move {
            simulate_player(client, base_url, player).await;
        }));
    }

    // 대기 중인 출금을 주기적으로 승인
    {
        let client = client.clone();
        let base_url = config.api_base_url.clone();
        handles.push(tokio::spawn(async move {
            approve_withdrawals(client, base_url, admin_token).await;
        }));
    }

    // 모든 시뮬레이션이 실행되도록 대기
    for handle in handles {
        handle.await.map_err(|e| e.to_string())?;
    }

    Ok(())
}

async fn simulate_player(client: Client, base_url: String, player: Player) {
    println!("플레이어 시뮬레이션 시작: {}", player.username);

    loop {
        let (game_type, bet) = {
            let mut rng = thread_rng();
            (
                *GAME_TYPES.choose(&mut rng).unwrap_or(&"chess"),
                *BETS.choose(&mut rng).unwrap_or(&100),
            )
        };

        let body = json!({ "game_type": game_type, "bet": bet.to_string(), "currency": "INR" });
        match send(&client, &base_url, "POST", "/api/v1/matchmaking/join", &player.token, Some(body)).await {
            Ok(result) => info!("대기열 참가: {} -> {} ({} INR, {})", player.username, game_type, bet, result["status"]),
            Err(e) => {
                warn!("❌ 대기열 참가 실패: {} - {}", player.username, e);
                time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        }

        let match_id = match wait_for_match(&client, &base_url, &player).await {
            Some(match_id) => match_id,
            None => continue,
        };

        play_match(&client, &base_url, &player, &match_id).await;

        // 가끔 소액 출금 요청
        if thread_rng().gen_bool(0.2) {
            let body = json!({ "amount": "100", "currency": "INR", "method": "upi", "destination": format!("{}@upi", player.username) });
            match send(&client, &base_url, "POST", "/api/v1/withdrawals", &player.token, Some(body)).await {
                Ok(w) => info!("출금 요청: {} ({})", player.username, w["id"]),
                Err(e) => warn!("❌ 출금 요청 실패: {} - {}", player.username, e),
            }
        }

        time::sleep(Duration::from_millis(500)).await;
    }
}

/// 매치가 성립될 때까지 상태를 조회, 오래 걸리면 대기열을 떠남
async fn wait_for_match(client: &Client, base_url: &str, player: &Player) -> Option<String> {
    for _ in 0..30 {
        match send(client, base_url, "GET", "/api/v1/matchmaking/status", &player.token, None).await {
            Ok(status) if status["status"] == "playing" => {
                return status["match"]["id"].as_str().map(str::to_string);
            }
            Ok(_) => {}
            Err(e) => warn!("❌ 상태 조회 실패: {} - {}", player.username, e),
        }
        time::sleep(Duration::from_secs(1)).await;
    }

    if let Err(e) = send(client, base_url, "POST", "/api/v1/matchmaking/leave", &player.token, None).await {
        warn!("❌ 대기열 이탈 실패: {} - {}", player.username, e);
    }
    None
}

/// 점수를 몇 차례 보고하고, 가끔 기권한 뒤 정산될 때까지 대기
async fn play_match(client: &Client, base_url: &str, player: &Player, match_id: &str) {
    let rounds = thread_rng().gen_range(3..=8);
    let mut score: i64 = 0;

    for _ in 0..rounds {
        score += thread_rng().gen_range(0..=50);
        let path = format!("/api/v1/matches/{}/score", match_id);
        if let Err(e) = send(client, base_url, "POST", &path, &player.token, Some(json!({ "score": score }))).await {
            warn!("❌ 점수 보고 실패: {} - {}", player.username, e);
            break;
        }
        let pause = thread_rng().gen_range(500..2000);
        time::sleep(Duration::from_millis(pause)).await;
    }

    if thread_rng().gen_bool(0.1) {
        let path = format!("/api/v1/matches/{}/forfeit", match_id);
        match send(client, base_url, "POST", &path, &player.token, None).await {
            Ok(_) => info!("기권: {} ({})", player.username, match_id),
            Err(e) => warn!("❌ 기권 실패: {} - {}", player.username, e),
        }
    }

    // 매치 종료(정산)까지 대기
    loop {
        let path = format!("/api/v1/matches/{}", match_id);
        match send(client, base_url, "GET", &path, &player.token, None).await {
            Ok(game) if game["status"] != "in_progress" => {
                println!(
                    "✅ 매치 종료: {} {} - 결과: {}",
                    player.username, match_id, game["outcome"]
                );
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("❌ 매치 조회 실패: {} - {}", player.username, e);
                return;
            }
        }
        time::sleep(Duration::from_secs(2)).await;
    }
}

async fn approve_withdrawals(client: Client, base_url: String, admin_token: String) {
    let mut interval = time::interval(Duration::from_secs(3));

    loop {
        interval.tick().await;
        let pending = match send(&client, &base_url, "GET", "/api/v1/admin/withdrawals?status=pending_approval", &admin_token, None).await {
            Ok(body) => body,
            Err(e) => {
                warn!("❌ 출금 목록 조회 실패: {}", e);
                continue;
            }
        };

        for withdrawal in pending["withdrawals"].as_array().cloned().unwrap_or_default() {
            let Some(id) = withdrawal["id"].as_str() else {
                continue;
            };
            let path = format!("/api/v1/admin/withdrawals/{}/approve", id);
            match send(&client, &base_url, "POST", &path, &admin_token, None).await {
                Ok(_) => info!("✅ 출금 승인: {}", id),
                Err(e) => warn!("❌ 출금 승인 실패: {} - {}", id, e),
            }
        }
    }
}

async fn admin_login(client: &Client, config: &SimConfig) -> Result<String, String> {
    let response = client
        .post(format!("{}/api/v1/auth/admin", config.api_base_url))
        .json(&json!({ "api_key": config.admin_api_key }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let body = parse_response(response).await?;
    body["token"].as_str().map(str::to_string).ok_or_else(|| "관리자 토큰 없음".to_string())
}

async fn register(client: &Client, base_url: &str, username: &str, currency: &str) -> Result<Player, String> {
    let response = client
        .post(format!("{}/api/v1/auth/register", base_url))
        .json(&json!({ "username": username, "currency": currency }))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let body = parse_response(response).await?;

    Ok(Player {
        username: username.to_string(),
        user_id: body["user_id"].as_str().unwrap_or_default().to_string(),
        token: body["token"].as_str().unwrap_or_default().to_string(),
    })
}

async fn credit(client: &Client, base_url: &str, admin_token: &str, user_id: &str, amount: u32) -> Result<(), String> {
    let path = format!("/api/v1/admin/wallets/{}/credit", user_id);
    let body = json!({ "amount": amount.to_string(), "note": "simulator funding" });
    send(client, base_url, "POST", &path, admin_token, Some(body)).await.map(|_| ())
}

async fn send(
    client: &Client,
    base_url: &str,
    method: &str,
    path: &str,
    token: &str,
    body: Option<Value>,
) -> Result<Value, String> {
    let url = format!("{}{}", base_url, path);
    let request = match method {
        "GET" => client.get(&url),
        _ => client.post(&url),
    };
    let request = request.bearer_auth(token);
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };

    let response = request.send().await.map_err(|e| e.to_string())?;
    parse_response(response).await
}

async fn parse_response(response: reqwest::Response) -> Result<Value, String> {
    let status = response.status();
    let text = response.text().await.map_err(|e| e.to_string())?;
    if status.is_success() {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    } else {
        Err(format!("HTTP {}: {}", status, text))
    }
}
