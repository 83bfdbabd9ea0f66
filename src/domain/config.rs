//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

/// トラッカーソース
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrackerSource {
    /// 外部トラッカープロセス（stdoutの改行区切りJSONを読み取る）
    #[default]
    Stdio,
    /// 合成ランドマークソース（開発・テスト用、実デバイス不要）
    Mock,
}

/// スクロール出力バックエンド
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBackend {
    /// HIDブリッジデバイスへのホイールレポート送信
    #[default]
    Hid,
    /// ログ出力のみのモック（開発・テスト用）
    Mock,
}

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// トラッカー設定
    pub tracker: TrackerConfig,
    /// ジェスチャー分類設定
    pub gesture: GestureConfig,
    /// スクロール出力設定
    pub scroll: ScrollConfig,
    /// パイプライン設定
    pub pipeline: PipelineConfig,
    /// オーバーレイ表示設定
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// トラッカー設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackerConfig {
    /// トラッカーソース
    ///
    /// 選択肢: "stdio", "mock"
    /// デフォルト: "stdio"
    #[serde(default)]
    pub source: TrackerSource,

    /// トラッカープロセスの起動コマンド（source = "stdio" の場合のみ有効）
    ///
    /// プロセスはstdoutに1行1フレームのJSONを出力すること:
    /// `{"width": 640, "height": 480, "landmarks": [[x, y], ...] | null}`
    #[serde(default = "default_tracker_command")]
    pub command: String,

    /// トラッカープロセスに渡す引数
    #[serde(default)]
    pub args: Vec<String>,

    /// サンプル待ちタイムアウト（ミリ秒）
    ///
    /// デフォルト: 100ms（30fpsのトラッカーで約3フレーム分）
    pub timeout_ms: u64,

    /// 連続タイムアウト許容回数
    ///
    /// この回数を超えたら再初期化を実行
    /// デフォルト: 50回（約5秒 @ 100ms）
    pub max_consecutive_timeouts: u32,

    /// 再初期化時の初期待機時間（ミリ秒）
    ///
    /// デフォルト: 100ms
    pub reinit_initial_delay_ms: u64,

    /// 再初期化時の最大待機時間（ミリ秒、指数バックオフの上限）
    ///
    /// デフォルト: 5000ms
    pub reinit_max_delay_ms: u64,
}

fn default_tracker_command() -> String {
    TrackerConfig::DEFAULT_COMMAND.to_string()
}

impl TrackerConfig {
    /// デフォルトのトラッカーコマンド
    pub const DEFAULT_COMMAND: &'static str = "hand-tracker";
    /// デフォルトのサンプル待ちタイムアウト（ミリ秒）
    pub const DEFAULT_TIMEOUT_MS: u64 = 100;
    /// デフォルトの連続タイムアウト閾値（約5秒 @ 100ms）
    pub const DEFAULT_MAX_CONSECUTIVE_TIMEOUTS: u32 = 50;
    /// デフォルトの再初期化初期遅延（ミリ秒）
    pub const DEFAULT_REINIT_INITIAL_DELAY_MS: u64 = 100;
    /// デフォルトの再初期化最大遅延（ミリ秒）
    pub const DEFAULT_REINIT_MAX_DELAY_MS: u64 = 5000;

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reinit_initial_delay(&self) -> Duration {
        Duration::from_millis(self.reinit_initial_delay_ms)
    }

    pub fn reinit_max_delay(&self) -> Duration {
        Duration::from_millis(self.reinit_max_delay_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            source: TrackerSource::default(),
            command: Self::DEFAULT_COMMAND.to_string(),
            args: Vec::new(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            max_consecutive_timeouts: Self::DEFAULT_MAX_CONSECUTIVE_TIMEOUTS,
            reinit_initial_delay_ms: Self::DEFAULT_REINIT_INITIAL_DELAY_MS,
            reinit_max_delay_ms: Self::DEFAULT_REINIT_MAX_DELAY_MS,
        }
    }
}

/// ジェスチャー分類設定
///
/// 構築時に一度だけGestureClassifierへ渡され、以降は不変。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GestureConfig {
    /// スクロールイベント発火間の最小間隔（秒）
    ///
    /// 連続したスワイプ動作が毎フレーム多重カウントされるのを防ぐ
    /// デフォルト: 0.4
    pub cooldown_seconds: f64,

    /// 移動量閾値（フレーム高さに対する比率）
    ///
    /// ピクセル値ではなく比率で指定するため、解像度に依存しない
    /// デフォルト: 0.05
    pub movement_threshold_ratio: f64,
}

impl GestureConfig {
    /// デフォルトのクールダウン（秒）
    pub const DEFAULT_COOLDOWN_SECONDS: f64 = 0.4;
    /// デフォルトの移動量閾値（フレーム高さ比）
    pub const DEFAULT_MOVEMENT_THRESHOLD_RATIO: f64 = 0.05;

    /// クールダウンをDurationとして取得
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_seconds.max(0.0))
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: Self::DEFAULT_COOLDOWN_SECONDS,
            movement_threshold_ratio: Self::DEFAULT_MOVEMENT_THRESHOLD_RATIO,
        }
    }
}

/// スクロール出力設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScrollConfig {
    /// スクロール出力バックエンド
    ///
    /// 選択肢: "hid", "mock"
    /// デフォルト: "hid"
    #[serde(default)]
    pub backend: ScrollBackend,

    /// HIDブリッジデバイスのVendor ID（16進数で指定する場合は 0x1234 の形式）
    pub vendor_id: u16,

    /// HIDブリッジデバイスのProduct ID
    pub product_id: u16,

    /// 1イベントあたりのホイール移動量（ティック数）
    ///
    /// デフォルト: 3
    pub scroll_step: i8,
}

impl ScrollConfig {
    /// デフォルトのホイール移動量（ティック）
    pub const DEFAULT_SCROLL_STEP: i8 = 3;
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            backend: ScrollBackend::default(),
            vendor_id: 0x0000,
            product_id: 0x0000,
            scroll_step: Self::DEFAULT_SCROLL_STEP,
        }
    }
}

/// パイプライン設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_interval_sec: 10,
        }
    }
}

/// オーバーレイ表示設定
///
/// overlay-display featureが有効な場合のみ実際に使用される。
/// feature無効時は設定値は読み込まれるが無視される。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OverlayConfig {
    /// オーバーレイウィンドウを表示するか
    pub enabled: bool,

    /// オーバーレイウィンドウのタイトル
    pub window_title: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_title: "Tefuri Overlay".to_string(),
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        // ジェスチャー設定の検証
        let gesture = &self.gesture;
        if !gesture.cooldown_seconds.is_finite() || gesture.cooldown_seconds < 0.0 {
            return Err(DomainError::Configuration(
                "cooldown_seconds must be a non-negative finite number".to_string(),
            ));
        }
        if !gesture.movement_threshold_ratio.is_finite()
            || gesture.movement_threshold_ratio <= 0.0
            || gesture.movement_threshold_ratio > 1.0
        {
            return Err(DomainError::Configuration(
                "movement_threshold_ratio must be in (0.0, 1.0]".to_string(),
            ));
        }

        // トラッカー設定の検証
        if self.tracker.timeout_ms == 0 {
            return Err(DomainError::Configuration(
                "Tracker timeout must be greater than 0".to_string(),
            ));
        }
        if self.tracker.source == TrackerSource::Stdio && self.tracker.command.is_empty() {
            return Err(DomainError::Configuration(
                "Tracker command must not be empty when source is \"stdio\"".to_string(),
            ));
        }

        // スクロール設定の検証
        if self.scroll.scroll_step <= 0 {
            return Err(DomainError::Configuration(
                "scroll_step must be greater than 0".to_string(),
            ));
        }

        // パイプライン設定の検証
        if self.pipeline.stats_interval_sec == 0 {
            return Err(DomainError::Configuration(
                "stats_interval_sec must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tracker.source, TrackerSource::Stdio);
        assert_eq!(config.tracker.timeout_ms, 100);
        assert_eq!(config.gesture.cooldown_seconds, 0.4);
        assert_eq!(config.gesture.movement_threshold_ratio, 0.05);
        assert_eq!(config.scroll.scroll_step, 3);
    }

    #[test]
    fn test_gesture_cooldown_duration() {
        let gesture = GestureConfig {
            cooldown_seconds: 0.4,
            movement_threshold_ratio: 0.05,
        };
        assert_eq!(gesture.cooldown(), Duration::from_millis(400));
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        // 不正なクールダウン
        config.gesture.cooldown_seconds = -1.0;
        assert!(config.validate().is_err());

        config.gesture.cooldown_seconds = 0.4;

        // 不正な閾値
        config.gesture.movement_threshold_ratio = 0.0;
        assert!(config.validate().is_err());

        config.gesture.movement_threshold_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_stdio_command() {
        let mut config = AppConfig::default();
        config.tracker.source = TrackerSource::Stdio;
        config.tracker.command = String::new();
        assert!(config.validate().is_err());

        // mockソースならコマンドは不要
        config.tracker.source = TrackerSource::Mock;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_positive_scroll_step() {
        let mut config = AppConfig::default();
        config.scroll.scroll_step = 0;
        assert!(config.validate().is_err());

        config.scroll.scroll_step = -3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_with_all_sections() {
        let toml = r#"
            [tracker]
            source = "mock"
            command = "hand-tracker"
            args = ["--camera", "0"]
            timeout_ms = 100
            max_consecutive_timeouts = 50
            reinit_initial_delay_ms = 100
            reinit_max_delay_ms = 5000

            [gesture]
            cooldown_seconds = 0.4
            movement_threshold_ratio = 0.05

            [scroll]
            backend = "mock"
            vendor_id = 0x2341
            product_id = 0x8036
            scroll_step = 3

            [pipeline]
            stats_interval_sec = 10

            [overlay]
            enabled = true
            window_title = "Tefuri Overlay"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.tracker.source, TrackerSource::Mock);
        assert_eq!(config.tracker.args, vec!["--camera", "0"]);
        assert_eq!(config.scroll.backend, ScrollBackend::Mock);
        assert_eq!(config.scroll.vendor_id, 0x2341);
        assert!(config.overlay.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlay_section_is_optional() {
        let toml = r#"
            [tracker]
            source = "mock"
            timeout_ms = 100
            max_consecutive_timeouts = 50
            reinit_initial_delay_ms = 100
            reinit_max_delay_ms = 5000

            [gesture]
            cooldown_seconds = 0.4
            movement_threshold_ratio = 0.05

            [scroll]
            backend = "mock"
            vendor_id = 0
            product_id = 0
            scroll_step = 3

            [pipeline]
            stats_interval_sec = 10
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(config.overlay.enabled);
        assert_eq!(config.overlay.window_title, "Tefuri Overlay");
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        AppConfig::write_default(&path).unwrap();
        let config = AppConfig::from_file(&path).unwrap();

        config.validate().unwrap();
        assert_eq!(config.gesture.cooldown_seconds, 0.4);
        assert_eq!(config.gesture.movement_threshold_ratio, 0.05);
    }

    #[test]
    fn test_config_loads() {
        // config.tomlが正常に読み込めることを確認
        let config = AppConfig::from_file("config.toml").expect("config.tomlが読み込めません");

        config
            .validate()
            .expect("設定値のバリデーションに失敗しました");

        assert!(
            config.tracker.timeout_ms > 0,
            "timeout_msは0より大きい必要があります"
        );
        assert!(
            config.gesture.movement_threshold_ratio > 0.0,
            "movement_threshold_ratioは0より大きい必要があります"
        );
    }

    #[test]
    fn test_config_example_loads() {
        // config.toml.exampleが正常に読み込めることを確認
        let config = AppConfig::from_file("config.toml.example")
            .expect("config.toml.exampleが読み込めません");

        config
            .validate()
            .expect("設定値のバリデーションに失敗しました");
    }
}
