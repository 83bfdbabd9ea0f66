/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// すべての処理で共有される不変の型。

use std::time::Instant;

/// 正規化された手ランドマーク座標
///
/// x, y ともに [0,1] の範囲で、フレーム幅/高さに対する相対値。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    /// 新しいランドマークを作成
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 1フレーム分の片手ランドマーク集合
///
/// 外部トラッカーが出力する順序付きの正規化座標列。
/// 1フレームの処理中のみ生存し、コアからは読み取り専用。
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// 新しいランドマーク集合を作成
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// ワイヤフォーマットの [x, y] ペア列から作成
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Self {
        Self {
            points: pairs.iter().map(|p| Landmark::new(p[0], p[1])).collect(),
        }
    }

    /// ランドマーク数を取得
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 空かどうかを判定
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 指定インデックスのランドマークを取得
    ///
    /// # Returns
    /// - `Some(Landmark)`: インデックスが範囲内
    /// - `None`: 範囲外
    pub fn point(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }
}

/// ピクセル座標系のパーム中心
///
/// PalmLocatorがランドマーク集合から導出する。1フレームごとに再計算され、
/// 直前フレームの値のみGestureClassifierが状態として保持する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PalmCenter {
    /// X座標（ピクセル、0 <= x < frame_width）
    pub x: f64,
    /// Y座標（ピクセル、0 <= y < frame_height、下方向が正）
    pub y: f64,
}

impl PalmCenter {
    /// 新しいパーム中心を作成
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// トラッカーが出力する1フレーム分のサンプル
///
/// フレーム寸法は毎サンプルに付随する。解像度が途中で変わっても
/// スクロール帯の再計算が追従する。
#[derive(Debug, Clone)]
pub struct TrackedSample {
    /// サンプル取得時刻
    pub timestamp: Instant,
    /// フレーム幅（ピクセル）
    pub width: u32,
    /// フレーム高さ（ピクセル）
    pub height: u32,
    /// 検出された手のランドマーク（None = 手なし。エラーではなく正常状態）
    pub landmarks: Option<LandmarkSet>,
}

impl TrackedSample {
    /// 現在時刻のタイムスタンプ付きでサンプルを作成
    pub fn new(width: u32, height: u32, landmarks: Option<LandmarkSet>) -> Self {
        Self {
            timestamp: Instant::now(),
            width,
            height,
            landmarks,
        }
    }
}

/// 分類されたジェスチャーイベント
///
/// コアの唯一の外部出力。値のみで同一性や所有権の概念はない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// ジェスチャーなし
    None,
    /// 上スクロール（手が上方向に閾値以上移動）
    ScrollUp,
    /// 下スクロール（手が下方向に閾値以上移動）
    ScrollDown,
}

impl GestureEvent {
    /// ログ・オーバーレイ表示用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ScrollUp => "scroll_up",
            Self::ScrollDown => "scroll_down",
        }
    }

    /// スクロールイベントかどうかを判定
    pub fn is_scroll(&self) -> bool {
        !matches!(self, Self::None)
    }
}
