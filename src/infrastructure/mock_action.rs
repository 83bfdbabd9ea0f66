/// モックアクションアダプタ
///
/// テスト・開発用のスクロール出力モック実装。
/// 送信レポートをログに出力し、検証用に記録する。

use crate::domain::{ActionPort, DomainResult};
use std::sync::{Arc, Mutex};

/// モックアクションアダプタ
pub struct MockActionAdapter {
    connected: bool,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockActionAdapter {
    /// 新しいモックアクションアダプタを作成
    pub fn new() -> Self {
        Self {
            connected: true,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 送信レポートの記録へのハンドルを取得
    ///
    /// アダプタをパイプラインへ移動する前にcloneしておくことで、
    /// テストから送信内容を検証できる。
    pub fn sent_log(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.sent)
    }
}

impl Default for MockActionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPort for MockActionAdapter {
    fn send(&mut self, data: &[u8]) -> DomainResult<()> {
        #[cfg(debug_assertions)]
        tracing::debug!(
            "MockAction: Sending {} bytes: {:02X?}",
            data.len(),
            &data[..data.len().min(16)]
        );

        self.sent.lock().unwrap().push(data.to_vec());

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reconnect(&mut self) -> DomainResult<()> {
        self.connected = true;

        #[cfg(debug_assertions)]
        tracing::info!("MockAction: Reconnected");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_action_records_reports() {
        let mut adapter = MockActionAdapter::new();
        let log = adapter.sent_log();

        adapter.send(&[0x02, 0x03, 0x00, 0xFF]).unwrap();
        adapter.send(&[0x02, 0xFD, 0x00, 0xFF]).unwrap();

        let sent = log.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], vec![0x02, 0x03, 0x00, 0xFF]);
        assert_eq!(sent[1], vec![0x02, 0xFD, 0x00, 0xFF]);
    }

    #[test]
    fn test_mock_action_is_connected() {
        let mut adapter = MockActionAdapter::new();
        assert!(adapter.is_connected());
        assert!(adapter.reconnect().is_ok());
    }
}
