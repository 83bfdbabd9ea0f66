/// HIDスクロールアダプタ
///
/// hidapiを使用したHIDブリッジデバイスへのホイールレポート送信実装。
/// 低レイテンシを重視し、非ブロッキング送信を行う。

use crate::domain::{ActionPort, DomainError, DomainResult};
use hidapi::{HidApi, HidDevice};
use std::sync::Mutex;

/// HIDスクロールアダプタ
///
/// HidDeviceはSync traitを実装していないため、Mutexでラップする。
/// これによりスレッド間で安全に共有できる。
pub struct HidScrollAdapter {
    /// HIDデバイスハンドル（Mutexでラップ）
    device: Mutex<Option<HidDevice>>,
    /// HID API インスタンス（Mutexでラップ）
    api: Mutex<HidApi>,
    /// Vendor ID
    vendor_id: u16,
    /// Product ID
    product_id: u16,
}

impl HidScrollAdapter {
    /// 新しいHIDスクロールアダプタを作成
    ///
    /// デバイスのオープンは遅延的: 初回接続に失敗しても起動は継続し、
    /// 再接続（reconnect）で復帰を試みる。
    ///
    /// # Arguments
    /// - `vendor_id`: HIDブリッジデバイスのVendor ID
    /// - `product_id`: HIDブリッジデバイスのProduct ID
    ///
    /// # Errors
    /// - HIDAPI初期化失敗
    pub fn new(vendor_id: u16, product_id: u16) -> DomainResult<Self> {
        let api = HidApi::new().map_err(|e| {
            DomainError::Communication(format!("Failed to initialize HIDAPI: {:?}", e))
        })?;

        // デバイスのオープンを試行
        let device = match api.open(vendor_id, product_id) {
            Ok(dev) => {
                tracing::info!(
                    "HID scroll device opened: VID=0x{:04X}, PID=0x{:04X}",
                    vendor_id,
                    product_id
                );
                Some(dev)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open HID scroll device (VID=0x{:04X}, PID=0x{:04X}): {:?}. Will retry on reconnect.",
                    vendor_id,
                    product_id,
                    e
                );
                None
            }
        };

        Ok(Self {
            device: Mutex::new(device),
            api: Mutex::new(api),
            vendor_id,
            product_id,
        })
    }
}

impl ActionPort for HidScrollAdapter {
    /// ホイールレポートを送信
    ///
    /// # 低レイテンシ最適化
    /// - エラー時は自動再接続を試行せず、即座にエラーを返す
    ///   （再接続は明示的なreconnect()呼び出しで実行。レート制限はApplication層）
    fn send(&mut self, data: &[u8]) -> DomainResult<()> {
        if data.is_empty() {
            return Err(DomainError::Communication("Empty data".to_string()));
        }

        let mut device_guard = self.device.lock().unwrap();
        let result = if let Some(ref mut device) = *device_guard {
            device.write(data)
        } else {
            Err(hidapi::HidError::HidApiError {
                message: "Device not connected".to_string(),
            })
        };

        match result {
            Ok(bytes_written) => {
                #[cfg(debug_assertions)]
                {
                    if bytes_written != data.len() {
                        tracing::warn!(
                            "Partial write: {} bytes written out of {}",
                            bytes_written,
                            data.len()
                        );
                    }
                }
                #[cfg(not(debug_assertions))]
                let _ = bytes_written;

                Ok(())
            }
            Err(e) => {
                #[cfg(debug_assertions)]
                tracing::error!("HID write failed: {:?}", e);

                // デバイス切断と判断
                *device_guard = None;

                Err(DomainError::Communication(format!(
                    "HID write failed: {:?}",
                    e
                )))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.device.lock().unwrap().is_some()
    }

    /// デバイスとの接続を再試行
    ///
    /// # 設計ノート
    /// - レート制限や指数バックオフはApplication層で実装
    /// - Infrastructure層はシンプルに再接続のみ行う
    fn reconnect(&mut self) -> DomainResult<()> {
        tracing::info!(
            "Attempting to reconnect HID scroll device (VID=0x{:04X}, PID=0x{:04X})...",
            self.vendor_id,
            self.product_id
        );

        // HID APIを再初期化（デバイス列挙を更新）
        let new_api = HidApi::new().map_err(|e| {
            DomainError::Communication(format!("Failed to reinitialize HIDAPI: {:?}", e))
        })?;

        // デバイスをオープン
        let device = new_api.open(self.vendor_id, self.product_id).map_err(|e| {
            DomainError::Communication(format!("Failed to open HID device: {:?}", e))
        })?;

        *self.api.lock().unwrap() = new_api;
        *self.device.lock().unwrap() = Some(device);

        tracing::info!("HID scroll device reconnected successfully");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 注: hidapiのグローバル初期化は同時に1インスタンスを前提とするため、
    // アダプタのライフサイクルは1テストにまとめている。

    #[test]
    fn test_adapter_without_device() {
        // ダミーのVID/PIDで作成（実デバイスなしでも成功する設計）
        let adapter = HidScrollAdapter::new(0x0000, 0x0000);
        assert!(adapter.is_ok());

        let mut adapter = adapter.unwrap();
        // デバイスが接続されていない場合はNone
        assert!(!adapter.is_connected());

        // デバイス未接続の状態で送信 → エラー
        let result = adapter.send(&[0x02, 0x03, 0x00, 0xFF]);
        assert!(result.is_err());

        // 空データの送信 → エラー
        let result = adapter.send(&[]);
        assert!(result.is_err());
    }
}
