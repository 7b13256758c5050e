use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};

use infra::config::{AppConfigImpl, LogConfig};
use infra::repository::postgres::schema;
use log::info;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {m}{n}";

fn init_logging(log_cfg: &LogConfig) -> anyhow::Result<()> {
    // RUST_LOG 优先于配置文件
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| log_cfg.level.clone());

    let mut builder = Config::builder().appender(Appender::builder().build(
        "stdout",
        Box::new(
            ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                .build(),
        ),
    ));
    let mut root = Root::builder().appender("stdout");

    // 配置了日志文件时同时输出到文件
    if let Some(path) = &log_cfg.file {
        let file_appender = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(path)
            .with_context(|| format!("failed to open log file {}", path))?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file_appender)));
        root = root.appender("file");
    }

    let config = builder.build(root.build(log_level.parse().unwrap_or(log::LevelFilter::Info)))?;
    log4rs::init_config(config)?;
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfigImpl::load().map_err(|e| anyhow!("failed to load configuration: {}", e))?;
    init_logging(cfg.log())?;

    let server_cfg = cfg.server().clone();
    let db = server::AppState::init_db(cfg.database())
        .await
        .context("failed to connect to database")?;
    if cfg.database().bootstrap_schema {
        schema::create_tables(&db)
            .await
            .context("failed to create tables")?;
    }

    let app_state = server::AppState::new(db, cfg)?;
    let app_state = web::Data::new(app_state);
    info!("listening on {}:{}", server_cfg.host, server_cfg.port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(server::native_api::configure_service)
    })
    .bind((server_cfg.host.as_str(), server_cfg.port))?
    .run()
    .await?;
    Ok(())
}
