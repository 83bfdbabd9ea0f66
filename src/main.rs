use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

use tefuri::application::pipeline::{PipelineConfig, PipelineRunner};
use tefuri::application::recovery::{RecoveryState, RecoveryStrategy};
use tefuri::domain::config::AppConfig;
use tefuri::domain::ports::TrackerPort; // traitメソッド使用のため
use tefuri::infrastructure::action_selector::ActionSelector;
use tefuri::infrastructure::tracker_selector::TrackerSelector;
use tefuri::logging::init_logging;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("tefuri starting...");

    // 初期化処理を実行
    match run() {
        Ok(_) => {
            tracing::info!("tefuri terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    // 設定の検証
    config.validate().context("Invalid configuration")?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Gesture: cooldown={:.2}s, threshold_ratio={:.3}",
        config.gesture.cooldown_seconds,
        config.gesture.movement_threshold_ratio
    );
    tracing::info!(
        "Tracker: source={:?}, timeout={}ms",
        config.tracker.source,
        config.tracker.timeout_ms
    );

    // トラッカーアダプタの初期化
    let tracker =
        TrackerSelector::from_config(&config.tracker).context("Failed to initialize tracker")?;
    tracing::info!("Tracker initialized: {}", tracker.source_name());

    // アクションアダプタの初期化
    let action = ActionSelector::from_config(&config.scroll)
        .context("Failed to initialize scroll backend")?;
    tracing::info!("Scroll backend initialized: {}", action.backend_name());

    // 再初期化戦略の設定
    let recovery_strategy = RecoveryStrategy {
        consecutive_timeout_threshold: config.tracker.max_consecutive_timeouts,
        initial_backoff: config.tracker.reinit_initial_delay(),
        max_backoff: config.tracker.reinit_max_delay(),
        max_cumulative_failure: Duration::from_secs(60),
    };
    let recovery = RecoveryState::new(recovery_strategy);

    // パイプライン設定
    let pipeline_config = PipelineConfig {
        stats_interval: Duration::from_secs(config.pipeline.stats_interval_sec),
        scroll_step: config.scroll.scroll_step,
    };

    tracing::info!("Starting pipeline with 4-thread architecture...");
    tracing::info!("Threads: Tracker -> Classify -> Action -> Stats/UI");

    // パイプラインの起動（ブロッキング）
    let runner = PipelineRunner::new(
        tracker,
        action,
        pipeline_config,
        config.gesture.clone(),
        config.overlay.clone(),
        recovery,
    );

    runner.run()?;

    Ok(())
}
