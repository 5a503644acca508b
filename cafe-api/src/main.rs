use cafe_api::config::Config;
use cafe_api::error::AppError;
use cafe_api::infrastructure::database::mysql::init_mysql;
use cafe_api::logging::init_logging;
use cafe_api::server::{AppState, create_app};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    init_logging(&config)?;

    tracing::info!("Starting cafe order service");

    // 初始化数据库连接
    let db_pool = init_mysql(&config).await?;

    let app_state = AppState {
        config: config.clone(),
        db: db_pool,
    };

    let app = create_app(app_state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", &addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
