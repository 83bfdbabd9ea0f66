/// パーム中心の算出（PalmLocator）
///
/// 21点ハンドランドマークモデルからパーム中心を推定する葉コンポーネント。
/// 状態を持たない純粋関数のみで構成される。

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::{LandmarkSet, PalmCenter};

/// 手首
pub const WRIST: usize = 0;
/// 親指CMC関節
pub const THUMB_CMC: usize = 1;
/// 人差し指MCP関節
pub const INDEX_MCP: usize = 5;
/// 中指MCP関節
pub const MIDDLE_MCP: usize = 9;
/// 薬指MCP関節
pub const RING_MCP: usize = 13;
/// 小指MCP関節
pub const PINKY_MCP: usize = 17;

/// パーム中心の計算に使用するランドマークインデックス
///
/// 手首 + 各指の付け根。21点モデルの固定サブセット。
pub const PALM_POINTS: [usize; 6] = [WRIST, THUMB_CMC, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// 21点ハンドランドマークモデルの総点数
pub const HAND_LANDMARK_COUNT: usize = 21;

/// ランドマーク集合からパーム中心をピクセル座標で算出
///
/// 6つのパーム点の単純算術平均。平滑化や外れ値除去は行わない
/// （平滑化を追加する場合はGestureClassifier側の責務）。
///
/// # Arguments
/// - `landmarks`: 正規化ランドマーク集合（PALM_POINTSの全インデックスを含むこと）
/// - `frame_width`: フレーム幅（ピクセル）
/// - `frame_height`: フレーム高さ（ピクセル）
///
/// # Returns
/// - `Ok(PalmCenter)`: ピクセル座標のパーム中心
/// - `Err(DomainError::InvalidInput)`: ランドマーク集合がパーム点を満たさない
///   （呼び出し側の契約違反。デフォルト座標で代替しない）
pub fn palm_center(
    landmarks: &LandmarkSet,
    frame_width: u32,
    frame_height: u32,
) -> DomainResult<PalmCenter> {
    let mut x_sum = 0.0;
    let mut y_sum = 0.0;

    for &index in &PALM_POINTS {
        let point = landmarks.point(index).ok_or_else(|| {
            DomainError::InvalidInput(format!(
                "Landmark set has {} points, palm point index {} is missing",
                landmarks.len(),
                index
            ))
        })?;

        x_sum += point.x * frame_width as f64;
        y_sum += point.y * frame_height as f64;
    }

    let n = PALM_POINTS.len() as f64;
    Ok(PalmCenter::new(x_sum / n, y_sum / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Landmark;

    /// 全21点が同一座標のランドマーク集合を作成
    fn uniform_hand(x: f64, y: f64) -> LandmarkSet {
        LandmarkSet::new(vec![Landmark::new(x, y); HAND_LANDMARK_COUNT])
    }

    #[test]
    fn test_palm_center_uniform() {
        // 全点 (0.5, 0.25) → 中心は (0.5 * 640, 0.25 * 480)
        let landmarks = uniform_hand(0.5, 0.25);
        let center = palm_center(&landmarks, 640, 480).unwrap();

        assert!((center.x - 320.0).abs() < 1e-9);
        assert!((center.y - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_palm_center_is_mean_of_palm_points() {
        // パーム点だけを動かし、平均が追従することを確認
        let mut points = vec![Landmark::new(0.0, 0.0); HAND_LANDMARK_COUNT];
        points[WRIST] = Landmark::new(0.6, 0.6);
        let landmarks = LandmarkSet::new(points);

        // 1点のみ (0.6, 0.6)、残り5点は (0, 0) → 平均 0.1
        let center = palm_center(&landmarks, 100, 100).unwrap();
        assert!((center.x - 10.0).abs() < 1e-9);
        assert!((center.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_palm_center_ignores_finger_tips() {
        // パーム点以外（指先など）は結果に影響しない
        let base = uniform_hand(0.5, 0.5);

        let mut moved_points: Vec<Landmark> =
            (0..HAND_LANDMARK_COUNT).map(|_| Landmark::new(0.5, 0.5)).collect();
        moved_points[4] = Landmark::new(0.9, 0.1); // 親指の先端
        moved_points[8] = Landmark::new(0.1, 0.9); // 人差し指の先端
        let moved = LandmarkSet::new(moved_points);

        let center_base = palm_center(&base, 640, 480).unwrap();
        let center_moved = palm_center(&moved, 640, 480).unwrap();

        assert_eq!(center_base, center_moved);
    }

    #[test]
    fn test_palm_center_short_set_is_invalid_input() {
        // 小指MCP（インデックス17）を含まない集合は契約違反
        let landmarks = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); PINKY_MCP]);

        let result = palm_center(&landmarks, 640, 480);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn test_palm_center_empty_set_is_invalid_input() {
        let landmarks = LandmarkSet::new(Vec::new());

        let result = palm_center(&landmarks, 640, 480);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn test_palm_center_scales_with_frame_size() {
        // 同じ正規化座標でもフレームサイズでピクセル座標が変わる
        let landmarks = uniform_hand(0.5, 0.5);

        let small = palm_center(&landmarks, 640, 480).unwrap();
        let large = palm_center(&landmarks, 1920, 1080).unwrap();

        assert!((small.x - 320.0).abs() < 1e-9);
        assert!((small.y - 240.0).abs() < 1e-9);
        assert!((large.x - 960.0).abs() < 1e-9);
        assert!((large.y - 540.0).abs() < 1e-9);
    }
}
