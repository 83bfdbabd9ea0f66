//! パイプライン統合テスト
//!
//! スクリプト化したトラッカー入力からHIDレポート出力までを通しで検証する。
//! スクリプト枯渇後はトラッカーが復旧不能になり、パイプラインが
//! チャネルを排出して自発的に停止する（終了シーケンスの検証も兼ねる）。

use std::time::Duration;

use tefuri::application::pipeline::{PipelineConfig, PipelineRunner};
use tefuri::application::recovery::{RecoveryState, RecoveryStrategy};
use tefuri::domain::config::{GestureConfig, OverlayConfig};
use tefuri::domain::palm::HAND_LANDMARK_COUNT;
use tefuri::domain::types::{Landmark, LandmarkSet};
use tefuri::infrastructure::mock_action::MockActionAdapter;
use tefuri::infrastructure::mock_tracker::MockTrackerAdapter;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// 全21点が (x, y) にあるランドマーク集合
fn hand_at(x: f64, y: f64) -> Option<LandmarkSet> {
    Some(LandmarkSet::new(vec![
        Landmark::new(x, y);
        HAND_LANDMARK_COUNT
    ]))
}

/// スクリプト枯渇で即座に停止する再初期化戦略
fn give_up_immediately() -> RecoveryState {
    RecoveryState::new(RecoveryStrategy {
        consecutive_timeout_threshold: 5,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        max_cumulative_failure: Duration::ZERO,
    })
}

fn test_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        stats_interval: Duration::from_secs(60),
        scroll_step: 3,
    }
}

#[test]
fn test_scripted_run_emits_scroll_reports() {
    // シナリオ:
    //   基準 → 大きく下 (ScrollDown) → ロスト → 再出現（発火なし） → 大きく上 (ScrollUp)
    let script = vec![
        hand_at(0.5, 0.2),
        hand_at(0.5, 0.5), // Δ = +0.3 * 480 = 144px > 24px → ScrollDown
        None,              // 手のロスト: 基準リセット
        hand_at(0.5, 0.8), // 再出現: 基準がないため発火しない
        hand_at(0.5, 0.5), // Δ = -144px → ScrollUp
    ];

    let tracker =
        MockTrackerAdapter::with_script(WIDTH, HEIGHT, script, Duration::from_millis(30));
    let action = MockActionAdapter::new();
    let sent_log = action.sent_log();

    let gesture = GestureConfig {
        cooldown_seconds: 0.0, // テストではクールダウンを無効化
        movement_threshold_ratio: 0.05,
    };

    let runner = PipelineRunner::new(
        tracker,
        action,
        test_pipeline_config(),
        gesture,
        OverlayConfig::default(),
        give_up_immediately(),
    );
    runner.run().unwrap();

    let sent = sent_log.lock().unwrap();
    assert_eq!(
        sent.len(),
        2,
        "expected one ScrollDown and one ScrollUp, got {:?}",
        *sent
    );
    // ScrollDown → 負のホイール移動量
    assert_eq!(sent[0], vec![0x02, (-3i8) as u8, 0x00, 0xFF]);
    // ScrollUp → 正のホイール移動量
    assert_eq!(sent[1], vec![0x02, 3u8, 0x00, 0xFF]);
}

#[test]
fn test_no_hand_script_emits_nothing() {
    let script = vec![None, None, None, None];

    let tracker =
        MockTrackerAdapter::with_script(WIDTH, HEIGHT, script, Duration::from_millis(10));
    let action = MockActionAdapter::new();
    let sent_log = action.sent_log();

    let runner = PipelineRunner::new(
        tracker,
        action,
        test_pipeline_config(),
        GestureConfig::default(),
        OverlayConfig::default(),
        give_up_immediately(),
    );
    runner.run().unwrap();

    assert!(sent_log.lock().unwrap().is_empty());
}

#[test]
fn test_small_movement_script_emits_nothing() {
    // 閾値未満の移動（0.02 * 480 = 9.6px < 24px）はイベントにならない
    let script = vec![
        hand_at(0.5, 0.50),
        hand_at(0.5, 0.52),
        hand_at(0.5, 0.50),
        hand_at(0.5, 0.52),
    ];

    let tracker =
        MockTrackerAdapter::with_script(WIDTH, HEIGHT, script, Duration::from_millis(30));
    let action = MockActionAdapter::new();
    let sent_log = action.sent_log();

    let gesture = GestureConfig {
        cooldown_seconds: 0.0,
        movement_threshold_ratio: 0.05,
    };

    let runner = PipelineRunner::new(
        tracker,
        action,
        test_pipeline_config(),
        gesture,
        OverlayConfig::default(),
        give_up_immediately(),
    );
    runner.run().unwrap();

    assert!(sent_log.lock().unwrap().is_empty());
}
