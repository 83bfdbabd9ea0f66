/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。

use crate::domain::error::DomainResult;
use crate::domain::types::{GestureEvent, TrackedSample};

/// トラッカーポート: ランドマークサンプルの取得を抽象化
///
/// 外部のランドマークトラッカー（カメラ入力と手検出を所有する協調プロセス）
/// からのフレーム単位の入力を表す。
pub trait TrackerPort: Send + Sync {
    /// 次のサンプルを取得する
    ///
    /// # Returns
    /// - `Ok(Some(TrackedSample))`: 新しいサンプル（landmarksがNoneなら手なし）
    /// - `Ok(None)`: タイムアウト（新しいフレームなし）
    /// - `Err(DomainError)`: 致命的エラー（再初期化が必要）
    fn next_sample(&mut self) -> DomainResult<Option<TrackedSample>>;

    /// トラッカーソースを再初期化
    ///
    /// トラッカープロセスが終了した場合などに呼び出される。
    fn reinitialize(&mut self) -> DomainResult<()>;

    /// ソースの識別名を取得（起動ログ用）
    fn source_name(&self) -> &str;
}

/// アクションポート: スクロールコマンドの送信を抽象化
///
/// コアはこのポートを直接呼び出さず、分類結果を返すのみ。
/// 実行はApplication層のアクションスレッドが担う。
pub trait ActionPort: Send + Sync {
    /// スクロールレポートをデバイスに送信
    ///
    /// # Arguments
    /// - `data`: 送信データ（4バイトのスクロールレポート）
    ///
    /// # Returns
    /// - `Ok(())`: 送信成功
    /// - `Err(DomainError)`: 送信エラー（デバイス切断等）
    fn send(&mut self, data: &[u8]) -> DomainResult<()>;

    /// デバイスとの接続状態を確認
    fn is_connected(&self) -> bool;

    /// デバイスとの接続を再試行
    fn reconnect(&mut self) -> DomainResult<()>;
}

/// ジェスチャーイベントをホイール移動量に変換
///
/// # マッピング
/// - `ScrollUp` → `+step`（正 = 上スクロール）
/// - `ScrollDown` → `-step`（負 = 下スクロール）
/// - `None` → `None`（no-op、レポート送信なし）
pub fn scroll_delta(event: GestureEvent, step: i8) -> Option<i8> {
    match event {
        GestureEvent::ScrollUp => Some(step),
        GestureEvent::ScrollDown => Some(-step),
        GestureEvent::None => None,
    }
}

/// ホイール移動量をHIDレポートに変換するヘルパー
///
/// # レポート構造（4バイト）
/// - [0]: ReportID (固定 0x02)
/// - [1]: ホイール移動量 (i8、2の補数)
/// - [2]: Reserved (0x00)
/// - [3]: 終端 (0xFF)
pub fn scroll_to_hid_report(delta: i8) -> Vec<u8> {
    vec![0x02, delta as u8, 0x00, 0xFF]
}
