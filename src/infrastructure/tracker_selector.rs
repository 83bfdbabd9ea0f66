//! トラッカーアダプタのセレクタ（実行時選択用）
//!
//! ビルド時のfeatureフラグではなく、実行時に設定でトラッカーソースを選択する
//! ための列挙型。vtableのオーバーヘッドを避けるため、trait objectではなく
//! enumでディスパッチ。

use crate::domain::{
    DomainResult, TrackedSample, TrackerConfig, TrackerPort, TrackerSource,
};
use crate::infrastructure::mock_tracker::MockTrackerAdapter;
use crate::infrastructure::stdio_tracker::StdioTrackerAdapter;

/// モックトラッカーの既定フレームサイズ
const MOCK_FRAME_WIDTH: u32 = 640;
const MOCK_FRAME_HEIGHT: u32 = 480;

/// トラッカーアダプタの選択
pub enum TrackerSelector {
    /// 外部トラッカープロセス（NDJSON over stdout）
    Stdio(StdioTrackerAdapter),
    /// 合成ランドマークソース（開発用）
    Mock(MockTrackerAdapter),
}

impl TrackerSelector {
    /// 設定からトラッカーアダプタを構築
    pub fn from_config(config: &TrackerConfig) -> DomainResult<Self> {
        match config.source {
            TrackerSource::Stdio => Ok(Self::Stdio(StdioTrackerAdapter::spawn(config)?)),
            TrackerSource::Mock => Ok(Self::Mock(MockTrackerAdapter::new(
                MOCK_FRAME_WIDTH,
                MOCK_FRAME_HEIGHT,
            ))),
        }
    }
}

impl TrackerPort for TrackerSelector {
    fn next_sample(&mut self) -> DomainResult<Option<TrackedSample>> {
        match self {
            Self::Stdio(adapter) => adapter.next_sample(),
            Self::Mock(adapter) => adapter.next_sample(),
        }
    }

    fn reinitialize(&mut self) -> DomainResult<()> {
        match self {
            Self::Stdio(adapter) => adapter.reinitialize(),
            Self::Mock(adapter) => adapter.reinitialize(),
        }
    }

    fn source_name(&self) -> &str {
        match self {
            Self::Stdio(adapter) => adapter.source_name(),
            Self::Mock(adapter) => adapter.source_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_mock_source() {
        let config = TrackerConfig {
            source: TrackerSource::Mock,
            ..Default::default()
        };

        let selector = TrackerSelector::from_config(&config).unwrap();
        assert!(matches!(selector, TrackerSelector::Mock(_)));
        assert_eq!(selector.source_name(), "mock tracker");
    }
}
