use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use dotenvy::dotenv;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 声明子模块
mod config;
mod error;
mod models;
mod handlers;
mod services;

use config::AppConfig;
use services::form_controller::{evict_idle, FormController};
use services::generator_client::{GeneratorClient, HttpGeneratorClient};

// 全局状态：配置、生成器客户端，以及每个页面对应的表单会话
pub struct AppState {
    pub config: AppConfig,
    pub generator: Arc<dyn GeneratorClient>,
    pub forms: RwLock<HashMap<u64, FormController>>,
    pub next_form_id: AtomicU64,
}

impl AppState {
    pub fn new(config: AppConfig, generator: Arc<dyn GeneratorClient>) -> Self {
        Self {
            config,
            generator,
            forms: RwLock::new(HashMap::new()),
            next_form_id: AtomicU64::new(1),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // 开发阶段允许所有来源，表单页面通常由 IDE 内置服务器提供
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // 表单会话 (对应一个页面的生命周期)
        .route("/api/forms", post(handlers::form_handler::create_form))
        .route("/api/forms/:id", get(handlers::form_handler::get_form)
            .delete(handlers::form_handler::delete_form))
        .route("/api/forms/:id/entity-name", put(handlers::form_handler::set_entity_name))

        // 字段行与关联行
        .route("/api/forms/:id/fields", post(handlers::form_handler::add_field))
        .route("/api/forms/:id/fields/:row", put(handlers::form_handler::update_field))
        .route("/api/forms/:id/relationships", post(handlers::form_handler::add_relationship))
        .route("/api/forms/:id/relationships/:row", put(handlers::form_handler::update_relationship))
        .route("/api/forms/:id/rows/:row", delete(handlers::form_handler::remove_row))

        // 预览、校验与提交
        .route("/api/forms/:id/metadata", get(handlers::form_handler::preview_metadata))
        .route("/api/forms/:id/validate", post(handlers::form_handler::validate_form))
        .route("/api/forms/:id/submit", post(handlers::form_handler::submit_form))

        // 生成器上的代码预览与已生成文件
        .route("/api/forms/:id/preview", post(handlers::form_handler::preview_code))
        .route("/api/forms/:id/generated", get(handlers::form_handler::list_generated))
        .route("/api/forms/:id/generated/:entity", delete(handlers::form_handler::delete_generated))

        .route("/api/options", get(handlers::options_handler::list_options))

        // 中间件：日志记录和跨域
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 定时回收闲置会话，浏览器关闭页面时不一定会发出 DELETE
fn spawn_form_sweeper(state: Arc<AppState>) {
    let ttl = state.config.form_ttl;
    let period = ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let mut forms = state.forms.write().await;
            let evicted = evict_idle(&mut forms, ttl, Utc::now());
            if evicted > 0 {
                tracing::info!("--- 定时回收闲置会话: {} 个, 剩余 {} 个", evicted, forms.len());
            }
        }
    });
}

#[tokio::main]
async fn main() {
    // 1. 初始化日志系统
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. 加载 .env 环境变量
    dotenv().ok();
    let config = AppConfig::from_env().expect("Invalid configuration in environment");

    // 3. 生成器客户端，各会话共享同一个连接池
    let generator: Arc<dyn GeneratorClient> = Arc::new(HttpGeneratorClient::new());

    let addr = config.listen_addr;
    tracing::info!(
        "默认页面来源: {}, 端口改写: {} -> {}, 会话闲置上限: {:?}, 会话数上限: {}",
        config.page_origin,
        config.port_rewrite.dev_server_port,
        config.port_rewrite.app_server_port,
        config.form_ttl,
        config.max_forms
    );
    let shared_state = Arc::new(AppState::new(config, generator));
    spawn_form_sweeper(shared_state.clone());

    // 4. 构建路由并启动服务
    let app = build_router(shared_state);
    tracing::info!("🚀 Server started at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
