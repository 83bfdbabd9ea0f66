//! ランタイム状態管理（Application層）
//!
//! パイプライン全体の実行/停止フラグを管理します。
//! `Arc<AtomicBool>`を使用したロックフリー設計により、
//! 各スレッド（Tracker/Classify/Action/Stats）はループごとに
//! 数CPUサイクルで停止要求を確認できます。
//!
//! # パフォーマンス特性
//! - 読み取り: `Ordering::Relaxed` - 数CPUサイクル、ロック不要
//! - 書き込み: 停止要求時のみ（低頻度）
//! - メモリオーダー: Relaxed - 厳密な順序保証は不要（少し遅れて観測されても無害）

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// ランタイム状態（スレッド間で共有、ロックフリー）
#[derive(Clone)]
pub struct RuntimeState {
    /// パイプラインが実行中かどうか
    running: Arc<AtomicBool>,
}

impl RuntimeState {
    /// 新しいRuntimeStateを作成（実行中で開始）
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// パイプラインが実行中かどうかを確認（ロックフリー、超高速）
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// パイプラインの停止を要求
    ///
    /// 各スレッドは次のループ境界で停止要求を観測し、
    /// チャネルを排出してから終了する。
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}
