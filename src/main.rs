use anyhow::Result;
use log::{error, info};

use skillpay::config::ServerConfig;
use skillpay::server::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("설정 로드 실패: {}", e);
            return Err(e);
        }
    };

    info!(
        "설정: 포트 {}, 기준 통화 {}, 매치 {}초, 승자 몫 {}%",
        config.rest_port, config.native_currency, config.match_duration_secs, config.winner_share_percent
    );

    start_server(config).await
}
