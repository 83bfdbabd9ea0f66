/// 外部トラッカープロセスアダプタ
///
/// 設定されたコマンドを子プロセスとして起動し、stdoutの改行区切りJSONを
/// TrackedSampleへ変換する。カメラアクセスと手検出は子プロセスが所有し、
/// 本体はランドマークのストリームだけを受け取る。
///
/// # ワイヤフォーマット（1行1フレーム）
/// ```text
/// {"width": 640, "height": 480, "landmarks": [[0.51, 0.32], ...]}
/// {"width": 640, "height": 480, "landmarks": null}
/// ```
///
/// 読み取りは専用スレッドで行い、本体とはboundedチャネルで接続する
/// （タイムアウト付きのサンプル待ちを実現するため）。

use crate::domain::{
    DomainError, DomainResult, LandmarkSet, TrackedSample, TrackerConfig, TrackerPort,
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TrySendError};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// トラッカーのワイヤフォーマット
#[derive(Debug, Deserialize)]
struct TrackerFrame {
    /// フレーム幅（ピクセル）
    width: u32,
    /// フレーム高さ（ピクセル）
    height: u32,
    /// 正規化ランドマーク列（null/省略 = 手なし）
    #[serde(default)]
    landmarks: Option<Vec<[f64; 2]>>,
}

/// 1行のJSONをTrackedSampleへ変換
///
/// # Returns
/// - `Ok(TrackedSample)`: パース成功（受信時刻のタイムスタンプ付き）
/// - `Err(DomainError::Tracker)`: 不正な行（呼び出し側でログして読み飛ばす）
fn parse_frame_line(line: &str) -> DomainResult<TrackedSample> {
    let frame: TrackerFrame = serde_json::from_str(line)
        .map_err(|e| DomainError::Tracker(format!("Malformed tracker frame: {}", e)))?;

    let landmarks = frame
        .landmarks
        .map(|pairs| LandmarkSet::from_pairs(&pairs));

    Ok(TrackedSample::new(frame.width, frame.height, landmarks))
}

/// 外部トラッカープロセスアダプタ
pub struct StdioTrackerAdapter {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    child: Option<Child>,
    rx: Option<Receiver<TrackedSample>>,
    name: String,
}

impl StdioTrackerAdapter {
    /// トラッカープロセスを起動してアダプタを作成
    ///
    /// # Errors
    /// - コマンドの起動失敗（存在しないコマンド等）
    pub fn spawn(config: &TrackerConfig) -> DomainResult<Self> {
        let mut adapter = Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
            child: None,
            rx: None,
            name: format!("stdio tracker ({})", config.command),
        };
        adapter.start()?;
        Ok(adapter)
    }

    /// 子プロセスと読み取りスレッドを起動
    fn start(&mut self) -> DomainResult<()> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DomainError::Initialization(format!(
                    "Failed to spawn tracker process '{}': {}",
                    self.command, e
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DomainError::Initialization("Tracker process has no stdout".to_string())
        })?;

        let (tx, rx) = bounded::<TrackedSample>(4);

        // 読み取りスレッド: 1行パースしてチャネルへ。
        // 受信側が追いつかない分は破棄する（溜めない）
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Tracker stdout read failed: {}", e);
                        break;
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                match parse_frame_line(&line) {
                    Ok(sample) => match tx.try_send(sample) {
                        Ok(_) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => break,
                    },
                    Err(e) => {
                        // 不正な行は開発者向けの欠陥としてログし、読み飛ばす
                        tracing::warn!("Skipping tracker line: {:?}", e);
                    }
                }
            }
            tracing::info!("Tracker reader thread exiting (stream closed)");
        });

        tracing::info!(
            "Tracker process spawned: {} {:?}",
            self.command,
            self.args
        );

        self.child = Some(child);
        self.rx = Some(rx);
        Ok(())
    }

    /// 子プロセスを停止
    fn stop(&mut self) {
        self.rx = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl TrackerPort for StdioTrackerAdapter {
    fn next_sample(&mut self) -> DomainResult<Option<TrackedSample>> {
        let rx = self.rx.as_ref().ok_or(DomainError::DeviceNotAvailable)?;

        match rx.recv_timeout(self.timeout) {
            Ok(sample) => Ok(Some(sample)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DomainError::Tracker(
                "Tracker process stream closed".to_string(),
            )),
        }
    }

    fn reinitialize(&mut self) -> DomainResult<()> {
        self.stop();
        self.start()
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

impl Drop for StdioTrackerAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}
