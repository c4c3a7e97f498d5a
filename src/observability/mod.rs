//! 可观测性：tracing 日志写入数据目录下的文件（终端由 TUI 占用）
//!
//! 数据目录不可写时退到系统临时目录；两处都打不开则丢弃日志。日志初始化失败不阻止启动。

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 日志文件名
pub const LOG_FILE: &str = "calclab.log";

/// 已打开的日志文件；`fallback_from` 记录数据目录打开失败的原因
#[derive(Debug)]
pub struct LogTarget {
    pub file: File,
    pub path: PathBuf,
    pub fallback_from: Option<io::Error>,
}

fn open_log_file(dir: &Path) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// 先试数据目录，再试备用目录
pub fn open_log_target(data_dir: &Path, fallback_dir: &Path) -> Option<LogTarget> {
    match open_log_file(data_dir) {
        Ok((file, path)) => Some(LogTarget {
            file,
            path,
            fallback_from: None,
        }),
        Err(e) => open_log_file(fallback_dir)
            .ok()
            .map(|(file, path)| LogTarget {
                file,
                path,
                fallback_from: Some(e),
            }),
    }
}

/// 初始化日志：默认 info，可通过 RUST_LOG 覆盖；返回实际的日志文件路径
pub fn init(data_dir: &Path) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fallback_dir = std::env::temp_dir().join("calclab");
    let registry = tracing_subscriber::registry().with(filter);

    let Some(target) = open_log_target(data_dir, &fallback_dir) else {
        let _ = registry
            .with(fmt::layer().with_ansi(false).with_writer(io::sink))
            .try_init();
        return None;
    };

    let _ = registry
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(target.file)),
        )
        .try_init();
    if let Some(e) = target.fallback_from {
        tracing::warn!(
            "Cannot write log in {} ({}), logging to {}",
            data_dir.display(),
            e,
            target.path.display()
        );
    }
    Some(target.path)
}
