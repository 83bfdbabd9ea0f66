/// ジェスチャー分類ステートマシン（GestureClassifier）
///
/// パーム中心の垂直移動量を閾値とクールダウンで離散スクロールイベントに変換する。
/// 状態は直前フレームのパーム中心と最終アクション時刻のみ。
///
/// # 状態遷移の不変条件
/// - 手が検出されないフレームで previous_center は必ず None に戻る
///   （トラッキング断絶をまたいだ移動量は決して計算されない）
/// - 位置の更新はクールダウンやイベント発火と無関係に毎フレーム行われる
/// - 分類は全域関数であり、正しい入力に対して失敗しない

use std::time::{Duration, Instant};

use crate::domain::config::GestureConfig;
use crate::domain::types::{GestureEvent, PalmCenter};

/// ジェスチャー分類器
///
/// 単一のフレーム処理ループから順次呼び出されることを前提とし、
/// 複数スレッドからの同時変更には対応しない。
/// 時刻は呼び出し側から注入される（テストで合成タイムスタンプを使用可能）。
#[derive(Debug)]
pub struct GestureClassifier {
    /// 直前フレームのパーム中心（None = 直前フレームに手なし）
    previous_center: Option<PalmCenter>,
    /// 最後にイベントを発火した時刻（初期値は構築時刻）
    last_action_time: Instant,
    /// イベント発火間の最小間隔
    cooldown: Duration,
    /// 移動量閾値（フレーム高さに対する比率）
    movement_threshold_ratio: f64,
}

impl GestureClassifier {
    /// 新しい分類器を作成
    ///
    /// # Arguments
    /// - `config`: 閾値・クールダウン設定（構築後は不変）
    /// - `now`: 構築時刻。last_action_timeの初期値となるため、
    ///   起動直後の最初の大きな移動は起動からの経過時間次第でゲートされる
    pub fn new(config: &GestureConfig, now: Instant) -> Self {
        Self {
            previous_center: None,
            last_action_time: now,
            cooldown: config.cooldown(),
            movement_threshold_ratio: config.movement_threshold_ratio,
        }
    }

    /// 直前フレームのパーム中心を取得
    ///
    /// 表示用の移動量をパイプライン側で導出するためのアクセサ。
    pub fn previous_center(&self) -> Option<PalmCenter> {
        self.previous_center
    }

    /// 1フレーム分のパーム中心を分類し、内部状態を更新
    ///
    /// # Arguments
    /// - `center`: このフレームのパーム中心（None = 手なし）
    /// - `frame_height`: 現在のフレーム高さ（ピクセル）。スクロール帯は
    ///   毎回この値から再計算されるため、解像度変更に追従する
    /// - `now`: このフレームのタイムスタンプ（単調非減少であること）
    ///
    /// # Returns
    /// 分類されたジェスチャーイベント
    pub fn classify(
        &mut self,
        center: Option<PalmCenter>,
        frame_height: u32,
        now: Instant,
    ) -> GestureEvent {
        // 手なし: 基準位置をリセット（断絶をまたいだ見かけの移動を防ぐ）
        let Some(current) = center else {
            self.previous_center = None;
            return GestureEvent::None;
        };

        // 手が再出現した直後: 基準がないため初回はイベントを発火しない
        let Some(previous) = self.previous_center else {
            self.previous_center = Some(current);
            return GestureEvent::None;
        };

        // 画像座標系ではyは下方向に増加する（正 = 下方向の移動）
        let vertical_movement = current.y - previous.y;
        let scroll_band = self.movement_threshold_ratio * frame_height as f64;

        let mut event = GestureEvent::None;

        if now.duration_since(self.last_action_time) > self.cooldown {
            if vertical_movement > scroll_band {
                event = GestureEvent::ScrollDown;
                self.last_action_time = now;
            } else if vertical_movement < -scroll_band {
                event = GestureEvent::ScrollUp;
                self.last_action_time = now;
            }
        }

        // 位置の追跡はクールダウン・発火の有無と独立して継続する
        self.previous_center = Some(current);

        event
    }
}
