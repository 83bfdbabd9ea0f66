//! アクションアダプタのセレクタ（実行時選択用）
//!
//! 実行時に設定でスクロール出力バックエンドを選択するための列挙型。
//! enumディスパッチでtrait objectを回避する。

use crate::domain::{ActionPort, DomainResult, ScrollBackend, ScrollConfig};
use crate::infrastructure::hid_scroll::HidScrollAdapter;
use crate::infrastructure::mock_action::MockActionAdapter;

/// アクションアダプタの選択
pub enum ActionSelector {
    /// HIDブリッジデバイスへのホイールレポート送信
    Hid(HidScrollAdapter),
    /// ログ出力のみのモック
    Mock(MockActionAdapter),
}

impl ActionSelector {
    /// 設定からアクションアダプタを構築
    pub fn from_config(config: &ScrollConfig) -> DomainResult<Self> {
        match config.backend {
            ScrollBackend::Hid => Ok(Self::Hid(HidScrollAdapter::new(
                config.vendor_id,
                config.product_id,
            )?)),
            ScrollBackend::Mock => Ok(Self::Mock(MockActionAdapter::new())),
        }
    }

    /// バックエンドの表示名を取得
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Hid(_) => "HID (hidapi)",
            Self::Mock(_) => "Mock (log only)",
        }
    }
}

impl ActionPort for ActionSelector {
    fn send(&mut self, data: &[u8]) -> DomainResult<()> {
        match self {
            Self::Hid(adapter) => adapter.send(data),
            Self::Mock(adapter) => adapter.send(data),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Self::Hid(adapter) => adapter.is_connected(),
            Self::Mock(adapter) => adapter.is_connected(),
        }
    }

    fn reconnect(&mut self) -> DomainResult<()> {
        match self {
            Self::Hid(adapter) => adapter.reconnect(),
            Self::Mock(adapter) => adapter.reconnect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_mock_backend() {
        let config = ScrollConfig {
            backend: ScrollBackend::Mock,
            ..Default::default()
        };

        let selector = ActionSelector::from_config(&config).unwrap();
        assert!(matches!(selector, ActionSelector::Mock(_)));
        assert_eq!(selector.backend_name(), "Mock (log only)");
    }
}
