//! # rollcall 웹 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성
//! 4. 데이터베이스 마이그레이션과 관리자 계정 시드
//! 5. API 라우터 설정
//! 6. HTTP 서버 시작
//!
//! DB 연결, 마이그레이션, 시드가 실패해도 서버는 종료하지 않고 로그만 남깁니다.
//! 그 상태에서 DB를 쓰는 요청은 500(`upstream_failure`)으로 응답합니다.

use anyhow::Result;
use rollcall::{bootstrap, config::Config, db, routes};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 rollcall, tower_http, axum 모듈을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting rollcall server on {}:{}", config.host, config.port);

    // ── 4단계: SQLite 연결 풀 생성 ──
    // 연결에 실패하면 지연 연결 풀로 대신하고 계속 진행합니다.
    let pool_options = SqlitePoolOptions::new().max_connections(5);
    let pool = match pool_options.clone().connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database connection failed, serving in degraded mode: {}", e);
            pool_options.connect_lazy(&config.database_url)?
        }
    };

    // ── 5단계: 마이그레이션과 초기 데이터 ──
    tracing::info!("Running database migrations...");
    match db::migrate(&pool).await {
        Ok(()) => {
            if let Err(e) = bootstrap::run(&pool, &config).await {
                tracing::error!("Database initialization failed: {}", e);
            }
        }
        Err(e) => tracing::error!("Database migration failed: {}", e),
    }

    // ── 6단계: 라우터 ──
    let state = routes::AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        history_limit: config.history_limit,
    };
    let api = routes::router(state);

    // 개발 환경 기준으로 모든 출처를 허용합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ── 7단계: 프론트엔드 정적 파일 서빙 ──
    // SPA이므로 찾을 수 없는 경로는 index.html로 돌려보냅니다.
    let frontend_dist = Path::new(&config.frontend_dist);
    let app = if frontend_dist.exists() {
        tracing::info!("Serving frontend static files from {}", config.frontend_dist);

        let serve_dir = ServeDir::new(frontend_dist)
            .not_found_service(ServeFile::new(frontend_dist.join("index.html")));

        api.fallback_service(serve_dir)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    } else {
        tracing::warn!("Frontend dist directory not found, serving API only");

        api.layer(cors).layer(TraceLayer::new_for_http())
    };

    // ── 8단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
