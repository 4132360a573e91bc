//! アプリケーションのエントリポイントとランタイム初期化。

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

mod app;
mod backend;
mod config;
mod earnings;
mod events;
mod history;
mod input;
mod layout;
mod session;
mod shortcuts;
mod trip;
mod ui;
mod wizard;
mod worker;

/// ファイルロギングを初期化し、非同期ガードを生存させる。
fn init_logging() -> Result<WorkerGuard> {
    let log_file = "rider_tui.log";
    // TUIの画面を崩さないよう、ファイルへ直接書き込む。
    let file_appender = tracing_appender::rolling::never(".", log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {}", log_file);
    Ok(guard)
}

#[tokio::main]
/// エントリポイント：ログ初期化→UI開始→端末復元。
async fn main() -> Result<()> {
    // ガードを保持して書き込みを継続させる。
    let _log_guard = init_logging()?;
    tracing::info!("app starting");
    let mut terminal = ui::init_terminal()?;
    let res = app::run_app(&mut terminal).await;
    // 端末の状態を必ず元に戻す。
    ui::restore_terminal()?;
    if let Err(ref e) = res {
        tracing::error!("app error: {e}");
    }
    tracing::info!("app exiting");
    res
}
