/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 手が検出されないことはエラーではなく正常状態（Option::Noneで表現）
/// - 呼び出し側の契約違反（InvalidInput）は即座に表面化させ、握りつぶさない

use thiserror::Error;

/// Domain層の統一エラー型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 呼び出し側の契約違反
    ///
    /// ランドマーク集合がパーム点インデックスを満たさない等。
    /// 実行時に回復すべき状態ではなく、開発者向けの欠陥。
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// トラッカー（ランドマーク入力）関連のエラー
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// 通信（HID送信）関連のエラー
    #[error("Communication error: {0}")]
    Communication(String),

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// デバイス一時不可（Recoverable）
    ///
    /// トラッカープロセスの再起動中など、すぐに復旧可能なエラー。
    #[error("Device temporarily unavailable")]
    DeviceNotAvailable,

    /// 再初期化必要（Non-recoverable）
    ///
    /// インスタンス再作成が必要な致命的エラー。
    #[error("Reinitialization required")]
    ReInitializationRequired,

    /// 初期化エラー
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// その他のエラー
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
