//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、外部技術（トラッカー子プロセス/HID/OpenCV）と接続する。

pub mod action_selector;
pub mod hid_scroll;
pub mod mock_action;
pub mod mock_tracker;
pub mod stdio_tracker;
pub mod tracker_selector;

// オーバーレイ表示モジュール（overlay-display feature有効時のみ）
#[cfg(feature = "overlay-display")]
pub mod overlay;
