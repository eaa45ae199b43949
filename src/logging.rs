//! tracing の初期化
//!
//! 既定はコンソール出力のみ。監視実行では保存ディレクトリ配下の
//! `dymon.log` にも書き出せる（non-blocking writer のガードは
//! プロセス終了まで保持すること）。フィルタは `RUST_LOG`、既定 `info`。

use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "dymon.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// コンソールのみのロガーを初期化する
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to initialize logging")?;
    Ok(())
}

/// コンソールに加えて `dir/dymon.log` へ出力するロガーを初期化する
pub fn init_with_log_file(dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("failed to initialize logging")?;

    Ok(guard)
}
