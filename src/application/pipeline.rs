//! パイプライン制御モジュール
//!
//! Tracker / Classify / Action / Stats の4スレッド構成でパイプラインを制御します。
//! スレッド間はboundedチャネルで接続し、サンプルは「最新のみ」ポリシーで流す。
//! 停止要求後は各スレッドがチャネルを排出してから終了するため、
//! 送信済みのスクロールイベントが失われることはない。

use crate::application::{
    recovery::RecoveryState,
    runtime_state::RuntimeState,
    stats::{StatKind, StatsCollector},
};
use crate::domain::{
    classifier::GestureClassifier,
    config::{GestureConfig, OverlayConfig},
    error::DomainResult,
    palm,
    ports::{scroll_delta, scroll_to_hid_report, ActionPort, TrackerPort},
    types::{GestureEvent, PalmCenter, TrackedSample},
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// 各スレッドの停止要求ポーリング間隔
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// パイプライン設定
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 統計出力間隔
    pub stats_interval: Duration,
    /// 1イベントあたりのホイール移動量（ティック数）
    pub scroll_step: i8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(10),
            scroll_step: 3,
        }
    }
}

/// 分類結果とタイムスタンプのペア
#[derive(Debug, Clone)]
pub struct ClassifiedFrame {
    /// 分類されたイベント
    pub event: GestureEvent,
    /// このフレームのパーム中心（None = 手なし）
    pub palm: Option<PalmCenter>,
    /// 表示用の垂直移動量（ピクセル、基準位置がない場合はNone）
    pub vertical_movement: Option<f64>,
    /// フレーム幅（ピクセル）
    pub width: u32,
    /// フレーム高さ（ピクセル）
    pub height: u32,
    /// サンプル取得時刻
    pub captured_at: Instant,
    /// 分類完了時刻
    pub classified_at: Instant,
}

/// 統計データ（Stats/UIスレッドへ送信用）
#[derive(Debug, Clone)]
pub struct StatData {
    pub frame: ClassifiedFrame,
    pub acted_at: Instant,
}

/// パイプライン実行コンテキスト
pub struct PipelineRunner<T, A>
where
    T: TrackerPort,
    A: ActionPort,
{
    tracker: Arc<Mutex<T>>,
    action: Arc<Mutex<A>>,
    config: PipelineConfig,
    gesture: GestureConfig,
    overlay: OverlayConfig,
    recovery: RecoveryState,
    stats: StatsCollector,
    runtime_state: RuntimeState,
}

impl<T, A> PipelineRunner<T, A>
where
    T: TrackerPort + Send + Sync + 'static,
    A: ActionPort + Send + Sync + 'static,
{
    /// 新しいPipelineRunnerを作成
    pub fn new(
        tracker: T,
        action: A,
        config: PipelineConfig,
        gesture: GestureConfig,
        overlay: OverlayConfig,
        recovery: RecoveryState,
    ) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            action: Arc::new(Mutex::new(action)),
            stats: StatsCollector::new(config.stats_interval),
            config,
            gesture,
            overlay,
            recovery,
            runtime_state: RuntimeState::new(),
        }
    }

    /// パイプラインを起動（ブロッキング）
    ///
    /// 停止要求（オーバーレイの終了キー、またはトラッカー復旧不能）まで戻らない。
    pub fn run(mut self) -> DomainResult<()> {
        let (sample_tx, sample_rx) = bounded::<TrackedSample>(1);
        let (gesture_tx, gesture_rx) = bounded::<ClassifiedFrame>(4);
        let (stats_tx, stats_rx) = bounded::<StatData>(64);

        // Tracker Thread
        let tracker_handle = {
            let tracker = Arc::clone(&self.tracker);
            let recovery = self.recovery;
            let state = self.runtime_state.clone();
            std::thread::spawn(move || {
                tracker_thread(tracker, sample_tx, recovery, state);
            })
        };

        // Classify Thread
        let classify_handle = {
            let gesture = self.gesture.clone();
            let state = self.runtime_state.clone();
            std::thread::spawn(move || {
                classify_thread(gesture, sample_rx, gesture_tx, state);
            })
        };

        // Action Thread
        let action_handle = {
            let action = Arc::clone(&self.action);
            let scroll_step = self.config.scroll_step;
            let state = self.runtime_state.clone();
            std::thread::spawn(move || {
                action_thread(action, gesture_rx, stats_tx, scroll_step, state);
            })
        };

        // Stats/UIスレッド（呼び出し元スレッドで実行）
        stats_thread(stats_rx, &mut self.stats, &self.runtime_state, &self.overlay);

        // スレッドの終了を待つ
        let _ = tracker_handle.join();
        let _ = classify_handle.join();
        let _ = action_handle.join();

        Ok(())
    }
}

/// Trackerスレッドのメインループ
///
/// タイムアウトの連続と致命的エラーを再初期化ロジックに流し込む。
fn tracker_thread<T: TrackerPort>(
    tracker: Arc<Mutex<T>>,
    tx: Sender<TrackedSample>,
    mut recovery: RecoveryState,
    state: RuntimeState,
) {
    tracing::info!("Tracker thread started");

    while state.is_running() {
        let result = {
            let mut guard = tracker.lock().unwrap();
            guard.next_sample()
        };

        match result {
            Ok(Some(sample)) => {
                recovery.record_success();
                send_latest_only(&tx, sample);
            }
            Ok(None) => {
                // タイムアウト - 新しいサンプルなし
                if recovery.record_timeout() {
                    tracing::warn!("Tracker timed out repeatedly, reinitializing...");
                    if !reinitialize_with_backoff(&tracker, &mut recovery, &state) {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Tracker error: {:?}", e);
                if !reinitialize_with_backoff(&tracker, &mut recovery, &state) {
                    break;
                }
            }
        }
    }

    tracing::info!("Tracker thread stopped");
}

/// 指数バックオフ付きでトラッカーを再初期化
///
/// # Returns
/// - `true`: 再初期化成功（メインループ継続）
/// - `false`: 復旧不能（パイプライン停止を要求済み）
fn reinitialize_with_backoff<T: TrackerPort>(
    tracker: &Arc<Mutex<T>>,
    recovery: &mut RecoveryState,
    state: &RuntimeState,
) -> bool {
    while state.is_running() {
        recovery.record_reinitialization_attempt();

        if recovery.is_cumulative_failure_exceeded() {
            tracing::error!(
                "Tracker could not be recovered (total attempts: {}), stopping pipeline",
                recovery.total_reinitializations()
            );
            state.request_stop();
            return false;
        }

        let backoff = recovery.current_backoff();
        tracing::info!("Reinitializing tracker (backoff: {:?})...", backoff);
        std::thread::sleep(backoff);

        let result = {
            let mut guard = tracker.lock().unwrap();
            guard.reinitialize()
        };

        match result {
            Ok(()) => {
                tracing::info!("Tracker reinitialized successfully");
                recovery.record_success();
                return true;
            }
            Err(e) => {
                tracing::warn!("Tracker reinitialization failed: {:?}", e);
            }
        }
    }

    false
}

/// Classifyスレッドのメインループ
///
/// GestureClassifierの唯一の書き込み側（single-writer discipline）。
fn classify_thread(
    gesture_config: GestureConfig,
    rx: Receiver<TrackedSample>,
    tx: Sender<ClassifiedFrame>,
    state: RuntimeState,
) {
    tracing::info!(
        "Classify thread started (cooldown: {:.2}s, threshold ratio: {:.3})",
        gesture_config.cooldown_seconds,
        gesture_config.movement_threshold_ratio
    );

    let mut classifier = GestureClassifier::new(&gesture_config, Instant::now());

    loop {
        match rx.recv_timeout(RECV_POLL_INTERVAL) {
            Ok(sample) => {
                let classified = crate::measure_span!("classify_frame", {
                    classify_sample(&mut classifier, &sample, Instant::now())
                });

                match classified {
                    Ok(frame) => {
                        if frame.event.is_scroll() {
                            tracing::debug!(
                                gesture = frame.event.as_str(),
                                movement = frame.vertical_movement.unwrap_or(0.0),
                                "Gesture classified"
                            );
                        }
                        send_classified(&tx, frame);
                    }
                    Err(e) => {
                        // 契約違反（ランドマーク不足）は開発者向けの欠陥。
                        // 分類器の状態には触れずにフレームを捨てる
                        tracing::error!("Classification error: {:?}", e);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !state.is_running() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!("Classify thread stopped");
}

/// 1サンプルをパーム算出 + 分類にかけてClassifiedFrameへ変換
///
/// PalmLocatorのエラー時は分類器の状態を一切変更せずエラーを返す。
pub(crate) fn classify_sample(
    classifier: &mut GestureClassifier,
    sample: &TrackedSample,
    now: Instant,
) -> DomainResult<ClassifiedFrame> {
    let palm = match &sample.landmarks {
        Some(landmarks) => Some(palm::palm_center(landmarks, sample.width, sample.height)?),
        None => None,
    };

    // 表示用の垂直移動量（分類前の基準位置から導出）
    let vertical_movement = match (palm, classifier.previous_center()) {
        (Some(current), Some(previous)) => Some(current.y - previous.y),
        _ => None,
    };

    let event = classifier.classify(palm, sample.height, now);

    Ok(ClassifiedFrame {
        event,
        palm,
        vertical_movement,
        width: sample.width,
        height: sample.height,
        captured_at: sample.timestamp,
        classified_at: now,
    })
}

/// Actionスレッドのメインループ
///
/// # 送信戦略
/// - スクロールイベントのみHIDレポートに変換して送信（Noneはno-op）
/// - 送信エラー時は指数バックオフでレート制限しつつ再接続を試みる
///   （初回: 100ms, 2回目: 200ms, ...最大10秒、最大リトライ10回）
/// - 最大リトライ超過後もスレッドは継続（デバイスが復帰した場合に備える）
fn action_thread<A: ActionPort>(
    action: Arc<Mutex<A>>,
    rx: Receiver<ClassifiedFrame>,
    stats_tx: Sender<StatData>,
    scroll_step: i8,
    state: RuntimeState,
) {
    tracing::info!("Action thread started (scroll step: {})", scroll_step);

    let mut consecutive_errors = 0u32;
    let mut last_reconnect_attempt = None::<Instant>;
    const MAX_RETRY: u32 = 10;
    const INITIAL_BACKOFF_MS: u64 = 100;
    const MAX_BACKOFF_MS: u64 = 10_000;

    loop {
        let frame = match rx.recv_timeout(RECV_POLL_INTERVAL) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => {
                if !state.is_running() {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if let Some(delta) = scroll_delta(frame.event, scroll_step) {
            let report = scroll_to_hid_report(delta);
            let send_result = {
                let mut guard = action.lock().unwrap();
                guard.send(&report)
            };

            match send_result {
                Ok(()) => {
                    tracing::info!("Scrolling {}", if delta > 0 { "up" } else { "down" });

                    if consecutive_errors > 0 {
                        tracing::info!("Scroll device communication recovered");
                        consecutive_errors = 0;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::error!(
                        "Scroll send error (consecutive: {}): {:?}",
                        consecutive_errors,
                        e
                    );

                    if consecutive_errors <= MAX_RETRY {
                        // 指数バックオフの計算
                        let backoff_ms = (INITIAL_BACKOFF_MS * 2u64.pow(consecutive_errors - 1))
                            .min(MAX_BACKOFF_MS);

                        // レート制限: 前回の再接続試行から十分な時間が経過しているか確認
                        let should_retry = match last_reconnect_attempt {
                            Some(last) => last.elapsed() >= Duration::from_millis(backoff_ms),
                            None => true,
                        };

                        if should_retry {
                            tracing::info!(
                                "Attempting to reconnect scroll device (retry {}/{}, backoff: {}ms)",
                                consecutive_errors,
                                MAX_RETRY,
                                backoff_ms
                            );

                            last_reconnect_attempt = Some(Instant::now());

                            let reconnect_result = {
                                let mut guard = action.lock().unwrap();
                                guard.reconnect()
                            };

                            match reconnect_result {
                                Ok(()) => {
                                    tracing::info!("Scroll device reconnected successfully");
                                    consecutive_errors = 0;
                                }
                                Err(reconnect_err) => {
                                    tracing::warn!("Reconnect failed: {:?}", reconnect_err);
                                }
                            }
                        }
                    } else {
                        tracing::error!(
                            "Max retry count exceeded ({}), giving up on scroll transmission",
                            MAX_RETRY
                        );
                    }
                }
            }
        }

        // 統計データをStats/UIスレッドに送信（非ブロッキング、破棄可）
        let stat = StatData {
            frame,
            acted_at: Instant::now(),
        };
        let _ = stats_tx.try_send(stat);
    }

    tracing::info!("Action thread stopped");
}

/// Stats/UIスレッド（統計情報管理とオーバーレイ表示）
fn stats_thread(
    rx: Receiver<StatData>,
    stats: &mut StatsCollector,
    state: &RuntimeState,
    overlay_config: &OverlayConfig,
) {
    tracing::info!("Stats/UI thread started");

    #[cfg(feature = "overlay-display")]
    let mut overlay = if overlay_config.enabled {
        match crate::infrastructure::overlay::OverlayWindow::new(&overlay_config.window_title) {
            Ok(window) => Some(window),
            Err(e) => {
                tracing::warn!("Failed to initialize overlay window: {:?}", e);
                None
            }
        }
    } else {
        None
    };
    #[cfg(not(feature = "overlay-display"))]
    let _ = overlay_config;

    loop {
        match rx.recv_timeout(RECV_POLL_INTERVAL) {
            Ok(stat) => {
                stats.record_frame();

                let classify_time = stat
                    .frame
                    .classified_at
                    .duration_since(stat.frame.captured_at);
                let action_time = stat.acted_at.duration_since(stat.frame.classified_at);
                let end_to_end = stat.acted_at.duration_since(stat.frame.captured_at);

                stats.record_duration(StatKind::Classify, classify_time);
                stats.record_duration(StatKind::Action, action_time);
                stats.record_duration(StatKind::EndToEnd, end_to_end);
                stats.record_gesture(stat.frame.event);

                // 定期的に統計出力
                if stats.should_report() {
                    stats.report_and_reset();
                }

                // オーバーレイ更新（overlay-display feature有効時のみ）
                #[cfg(feature = "overlay-display")]
                if let Some(ref mut window) = overlay {
                    let render_result = window.render(
                        stat.frame.palm,
                        stat.frame.vertical_movement,
                        stat.frame.event,
                        stat.frame.width,
                        stat.frame.height,
                    );
                    match render_result {
                        Ok(true) => {
                            tracing::info!("Overlay: quit key pressed");
                            state.request_stop();
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!("Overlay render failed: {:?}", e);
                        }
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !state.is_running() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!("Stats/UI thread stopped");
}

/// 最新のみ上書きポリシーで送信
///
/// bounded(1)キューを使用し、キューが満杯の場合は新しいデータを破棄。
/// 受信側が追いついていない間のサンプルはキューに溜めず捨てる（低レイテンシ最優先）。
pub(crate) fn send_latest_only<T>(tx: &Sender<T>, value: T) {
    match tx.try_send(value) {
        Ok(_) => {}
        Err(TrySendError::Full(_)) => {
            // キューが満杯 - 古いデータは受信側が処理する
            // Senderからは取り出せないため、単に無視
        }
        Err(TrySendError::Disconnected(_)) => {
            // Channel closed
        }
    }
}

/// 分類結果を非ブロッキングで送信
///
/// スクロールイベントはクールダウン間隔でしか発生しないためキューが
/// 満杯になることは実質ないが、万一イベントを破棄した場合は警告を残す。
fn send_classified(tx: &Sender<ClassifiedFrame>, frame: ClassifiedFrame) {
    match tx.try_send(frame) {
        Ok(_) => {}
        Err(TrySendError::Full(frame)) => {
            if frame.event.is_scroll() {
                tracing::warn!(
                    gesture = frame.event.as_str(),
                    "Action queue full, scroll event dropped"
                );
            }
        }
        Err(TrySendError::Disconnected(_)) => {
            // Channel closed
        }
    }
}
