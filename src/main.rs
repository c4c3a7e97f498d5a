//! CalcLab - 终端计算器
//!
//! 入口：加载配置、初始化日志、创建会话编排器与 TUI，并运行主循环。

use anyhow::Context;
use calclab::{config::load_config, core::create_app, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let (cfg, config_error) = match load_config(config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (Default::default(), Some(e)),
    };

    // 日志打不开时照常启动
    let data_dir = cfg.app.resolve_data_dir();
    let log_path = calclab::observability::init(&data_dir);
    if let Some(e) = config_error {
        tracing::warn!("Config load failed, using defaults: {}", e);
    }
    match log_path {
        Some(path) => tracing::info!("CalcLab starting, logs at {}", path.display()),
        None => tracing::info!("CalcLab starting without a log file"),
    }

    // 创建会话：返回命令发送端、状态接收端
    let (cmd_tx, state_rx) = create_app(&cfg);

    run_app(state_rx, cmd_tx).await.context("App run failed")?;

    tracing::info!("CalcLab exited");
    Ok(())
}
