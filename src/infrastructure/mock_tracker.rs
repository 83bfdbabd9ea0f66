/// モックトラッカーアダプタ
///
/// 実カメラ・外部プロセスなしで動作する合成ランドマークソース。
/// デフォルトでは正弦波で上下するパームを生成し（定期的に手のロストも模擬）、
/// スクリプトモードでは与えられたサンプル列を順に再生する。

use crate::domain::{
    palm::HAND_LANDMARK_COUNT, DomainError, DomainResult, Landmark, LandmarkSet, TrackedSample,
    TrackerPort,
};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::time::Duration;

/// 合成モードの既定フレーム間隔（約30fps）
const WAVE_FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// 合成モードの上下運動の周期（秒）
const WAVE_PERIOD_SECS: f64 = 2.0;
/// 手のロストを模擬する周期（フレーム数）
const WAVE_LOSS_CYCLE: u64 = 150;
/// 1周期あたりのロストフレーム数
const WAVE_LOSS_FRAMES: u64 = 30;

enum MockMode {
    /// 正弦波で上下する合成パーム（無限）
    Wave { frame: u64 },
    /// スクリプト再生（枯渇後は致命的エラー）
    Script {
        samples: VecDeque<Option<LandmarkSet>>,
    },
}

/// モックトラッカーアダプタ
pub struct MockTrackerAdapter {
    width: u32,
    height: u32,
    frame_interval: Duration,
    mode: MockMode,
}

impl MockTrackerAdapter {
    /// 合成ランドマークを生成するモックを作成（開発用）
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_interval: WAVE_FRAME_INTERVAL,
            mode: MockMode::Wave { frame: 0 },
        }
    }

    /// スクリプト再生モードのモックを作成（テスト用）
    ///
    /// サンプル列を先頭から順に返し、枯渇後のnext_sample()は致命的エラーを返す。
    pub fn with_script(
        width: u32,
        height: u32,
        script: Vec<Option<LandmarkSet>>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            width,
            height,
            frame_interval,
            mode: MockMode::Script {
                samples: script.into_iter().collect(),
            },
        }
    }

    /// 全21点を同一座標に置いたランドマーク集合を作成
    fn uniform_hand(x: f64, y: f64) -> LandmarkSet {
        LandmarkSet::new(vec![Landmark::new(x, y); HAND_LANDMARK_COUNT])
    }
}

impl TrackerPort for MockTrackerAdapter {
    fn next_sample(&mut self) -> DomainResult<Option<TrackedSample>> {
        // フレームレートの模擬
        std::thread::sleep(self.frame_interval);

        match &mut self.mode {
            MockMode::Wave { frame } => {
                *frame += 1;

                // 定期的に手のロストを模擬（リセットパスを実際に通すため）
                if *frame % WAVE_LOSS_CYCLE < WAVE_LOSS_FRAMES {
                    return Ok(Some(TrackedSample::new(self.width, self.height, None)));
                }

                let t = *frame as f64 * self.frame_interval.as_secs_f64();
                let y = 0.5 + 0.25 * (t * TAU / WAVE_PERIOD_SECS).sin();
                let landmarks = Self::uniform_hand(0.5, y);

                Ok(Some(TrackedSample::new(
                    self.width,
                    self.height,
                    Some(landmarks),
                )))
            }
            MockMode::Script { samples } => match samples.pop_front() {
                Some(landmarks) => Ok(Some(TrackedSample::new(
                    self.width,
                    self.height,
                    landmarks,
                ))),
                None => Err(DomainError::Tracker("Mock script exhausted".to_string())),
            },
        }
    }

    fn reinitialize(&mut self) -> DomainResult<()> {
        match &self.mode {
            MockMode::Wave { .. } => Ok(()),
            // スクリプトは再生し直さない（テストでの終了シーケンスに使用）
            MockMode::Script { .. } => Err(DomainError::ReInitializationRequired),
        }
    }

    fn source_name(&self) -> &str {
        "mock tracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_mode_produces_samples() {
        let mut mock = MockTrackerAdapter::new(640, 480);

        let sample = mock.next_sample().unwrap().unwrap();
        assert_eq!(sample.width, 640);
        assert_eq!(sample.height, 480);
    }

    #[test]
    fn test_wave_mode_reinitializes() {
        let mut mock = MockTrackerAdapter::new(640, 480);
        assert!(mock.reinitialize().is_ok());
    }

    #[test]
    fn test_script_mode_replays_then_fails() {
        let hand = MockTrackerAdapter::uniform_hand(0.5, 0.5);
        let mut mock = MockTrackerAdapter::with_script(
            640,
            480,
            vec![Some(hand.clone()), None],
            Duration::from_millis(1),
        );

        let first = mock.next_sample().unwrap().unwrap();
        assert_eq!(first.landmarks, Some(hand));

        let second = mock.next_sample().unwrap().unwrap();
        assert!(second.landmarks.is_none());

        // 枯渇後は致命的エラー
        assert!(mock.next_sample().is_err());
        // スクリプトモードは再初期化不可
        assert!(mock.reinitialize().is_err());
    }
}
