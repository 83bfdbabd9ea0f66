/// オーバーレイ表示モジュール
///
/// OpenCVを使用した視覚的デバッグ機能。黒背景のキャンバスに
/// パーム中心マーカー・垂直移動量・現在のジェスチャーを描画します。
/// `overlay-display` featureが有効な場合のみコンパイルされます。
///
/// # 操作方法
/// - ESCキーまたは'q'キー: パイプライン停止を要求

use crate::domain::{DomainError, DomainResult, GestureEvent, PalmCenter};
use opencv::{
    core::{Mat, Point, Scalar},
    highgui,
    imgproc::{self, FONT_HERSHEY_PLAIN, LINE_8},
};

const KEY_ESC: i32 = 27;
const KEY_Q: i32 = 113;

/// パーム中心マーカーの半径（ピクセル）
const PALM_MARKER_RADIUS: i32 = 10;

/// オーバーレイウィンドウ
pub struct OverlayWindow {
    title: String,
}

impl OverlayWindow {
    /// ウィンドウを作成
    ///
    /// WINDOW_AUTOSIZEで等倍表示（リサイズ不可）。
    pub fn new(title: &str) -> DomainResult<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(|e| {
            DomainError::Initialization(format!("Failed to create overlay window: {:?}", e))
        })?;

        Ok(Self {
            title: title.to_string(),
        })
    }

    /// 分類結果を描画し、終了キーが押されたかを返す
    ///
    /// # Arguments
    /// - `palm`: このフレームのパーム中心（None = 手なし）
    /// - `vertical_movement`: 表示用の垂直移動量（ピクセル）
    /// - `event`: 分類されたジェスチャー
    /// - `width` / `height`: フレーム寸法（キャンバスサイズに使用）
    ///
    /// # Returns
    /// - `Ok(true)`: ESCまたは'q'が押された（呼び出し側で停止要求すること）
    /// - `Ok(false)`: 継続
    pub fn render(
        &mut self,
        palm: Option<PalmCenter>,
        vertical_movement: Option<f64>,
        event: GestureEvent,
        width: u32,
        height: u32,
    ) -> DomainResult<bool> {
        // 黒背景のキャンバスをフレームサイズで作成
        let mut canvas = Mat::new_rows_cols_with_default(
            height as i32,
            width as i32,
            opencv::core::CV_8UC3,
            Scalar::new(0.0, 0.0, 0.0, 0.0),
        )
        .map_err(|e| DomainError::Other(format!("Failed to create overlay canvas: {:?}", e)))?;

        let red = Scalar::new(0.0, 0.0, 255.0, 0.0);
        let green = Scalar::new(0.0, 255.0, 0.0, 0.0);

        // パーム中心マーカー（塗りつぶし円）
        if let Some(palm) = palm {
            imgproc::circle(
                &mut canvas,
                Point::new(palm.x as i32, palm.y as i32),
                PALM_MARKER_RADIUS,
                green,
                -1,
                LINE_8,
                0,
            )
            .map_err(|e| DomainError::Other(format!("Failed to draw palm marker: {:?}", e)))?;
        }

        // 現在のジェスチャー
        imgproc::put_text(
            &mut canvas,
            &format!("Gesture: {}", event.as_str()),
            Point::new(10, 30),
            FONT_HERSHEY_PLAIN,
            0.7,
            red,
            2,
            LINE_8,
            false,
        )
        .map_err(|e| DomainError::Other(format!("Failed to draw text: {:?}", e)))?;

        // 垂直移動量（基準位置がある場合のみ）
        if let Some(movement) = vertical_movement {
            imgproc::put_text(
                &mut canvas,
                &format!("V-Move: {:.2}", movement),
                Point::new(10, 60),
                FONT_HERSHEY_PLAIN,
                0.7,
                red,
                2,
                LINE_8,
                false,
            )
            .map_err(|e| DomainError::Other(format!("Failed to draw text: {:?}", e)))?;
        }

        highgui::imshow(&self.title, &canvas)
            .map_err(|e| DomainError::Other(format!("Failed to show overlay window: {:?}", e)))?;

        // キー入力を待つ（1ms、ノンブロッキング）
        let key = highgui::wait_key(1)
            .map_err(|e| DomainError::Other(format!("Failed to wait for key: {:?}", e)))?;

        Ok(key == KEY_ESC || key == KEY_Q)
    }
}

impl Drop for OverlayWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.title);
    }
}
