//! Application Layer
//!
//! パイプライン制御、再初期化ロジック、統計管理などのユースケースを実装します。
//!
//! ## モジュール構成
//! - `pipeline`: 4スレッドパイプライン制御（Tracker/Classify/Action/Stats）
//! - `recovery`: トラッカー再初期化ロジック（指数バックオフ）
//! - `runtime_state`: 実行/停止フラグ（ロックフリー）
//! - `stats`: 統計情報管理（FPS、レイテンシ、ジェスチャー数）

pub mod pipeline;
pub mod recovery;
pub mod runtime_state;
pub mod stats;
