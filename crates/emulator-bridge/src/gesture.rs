//! Gesture Synthesizer
//!
//! Turns a symbolic direction into swipe coordinates from the device's
//! current screen size.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::adb::AdbClient;
use crate::device::ScreenGeometry;
use crate::runner::ToolError;

/// Swipe duration in milliseconds
pub const SWIPE_DURATION_MS: u32 = 300;

/// Percent of the axis where a swipe starts (moving toward the origin)
const FAR_PERCENT: u32 = 80;
/// Percent of the axis where a swipe ends (moving toward the origin)
const NEAR_PERCENT: u32 = 20;

/// Gesture errors
#[derive(Debug, thiserror::Error)]
pub enum GestureError {
    #[error("Unsupported direction '{0}', expected one of: up, down, left, right")]
    UnsupportedDirection(String),
    #[error("Could not read the screen size of the emulator on port {port}")]
    GeometryUnavailable { port: u16 },
    #[error("Swipe on port {port} failed: {source}")]
    Tool {
        port: u16,
        #[source]
        source: ToolError,
    },
}

/// Swipe direction: the way the finger moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(GestureError::UnsupportedDirection(s.to_string())),
        }
    }
}

/// Start and end of a swipe in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwipePath {
    pub from: (u32, u32),
    pub to: (u32, u32),
    pub duration_ms: u32,
}

/// Compute the swipe for `direction` on a screen of the given size.
///
/// The moving coordinate travels between 20% and 80% of its axis; the other
/// stays on the screen center.
pub fn swipe_path(geometry: &ScreenGeometry, direction: Direction) -> SwipePath {
    let (cx, cy) = geometry.center();
    // Widened so any reported size fits; the result never exceeds `extent`.
    let at = |extent: u32, percent: u32| (u64::from(extent) * u64::from(percent) / 100) as u32;

    let near_y = at(geometry.height, NEAR_PERCENT);
    let far_y = at(geometry.height, FAR_PERCENT);
    let near_x = at(geometry.width, NEAR_PERCENT);
    let far_x = at(geometry.width, FAR_PERCENT);

    let (from, to) = match direction {
        Direction::Up => ((cx, far_y), (cx, near_y)),
        Direction::Down => ((cx, near_y), (cx, far_y)),
        Direction::Left => ((far_x, cy), (near_x, cy)),
        Direction::Right => ((near_x, cy), (far_x, cy)),
    };

    SwipePath {
        from,
        to,
        duration_ms: SWIPE_DURATION_MS,
    }
}

/// Injects gestures into running emulators
#[derive(Clone)]
pub struct GestureSynthesizer {
    adb: AdbClient,
}

impl GestureSynthesizer {
    pub fn new(adb: AdbClient) -> Self {
        Self { adb }
    }

    /// Swipe in `direction` on the emulator listening on `port`.
    ///
    /// The direction is validated before anything is sent to the device.
    pub async fn swipe(&self, port: u16, direction: &str) -> Result<SwipePath, GestureError> {
        let direction: Direction = direction.parse()?;

        let geometry = self
            .adb
            .screen_geometry(port)
            .await
            .map_err(|source| GestureError::Tool { port, source })?
            .ok_or(GestureError::GeometryUnavailable { port })?;

        let path = swipe_path(&geometry, direction);

        self.adb
            .input_swipe(port, path.from, path.to, path.duration_ms)
            .await
            .map_err(|source| GestureError::Tool { port, source })?;

        info!(
            "Swiped {} on port {}: {:?} -> {:?}",
            direction, port, path.from, path.to
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use avd_pilot_android_toolchain::AndroidTool;

    use crate::testing::ScriptedRunner;

    const PHONE: ScreenGeometry = ScreenGeometry {
        width: 1080,
        height: 2400,
        scale: 2.625,
    };

    #[test]
    fn test_swipe_up_path() {
        let path = swipe_path(&PHONE, Direction::Up);
        assert_eq!(path.from, (540, 1920));
        assert_eq!(path.to, (540, 480));
        assert_eq!(path.duration_ms, SWIPE_DURATION_MS);
    }

    #[test]
    fn test_opposite_directions_are_reversed() {
        for (a, b) in [(Direction::Up, Direction::Down), (Direction::Left, Direction::Right)] {
            let forward = swipe_path(&PHONE, a);
            let back = swipe_path(&PHONE, b);
            assert_eq!(forward.from, back.to);
            assert_eq!(forward.to, back.from);
        }
    }

    #[test]
    fn test_horizontal_swipe_stays_on_center_line() {
        let path = swipe_path(&PHONE, Direction::Left);
        assert_eq!(path.from, (864, 1200));
        assert_eq!(path.to, (216, 1200));
    }

    #[test]
    fn test_huge_reported_size_does_not_overflow() {
        let wide = ScreenGeometry {
            width: 60_000_000,
            height: 2400,
            scale: 1.0,
        };
        let path = swipe_path(&wide, Direction::Left);
        assert_eq!(path.from, (48_000_000, 1200));
        assert_eq!(path.to, (12_000_000, 1200));

        let max = ScreenGeometry {
            width: u32::MAX,
            height: u32::MAX,
            scale: 1.0,
        };
        let path = swipe_path(&max, Direction::Down);
        assert_eq!(path.to.1, (u64::from(u32::MAX) * 80 / 100) as u32);
        assert!(path.from.1 < path.to.1);
    }

    #[tokio::test]
    async fn test_huge_size_from_wm_is_swiped_without_panic() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(AndroidTool::Adb, "wm size", "Physical size: 60000000x2400\n")
                .on(AndroidTool::Adb, "input swipe", ""),
        );
        let gestures = GestureSynthesizer::new(AdbClient::new(runner.clone()));

        gestures.swipe(5554, "left").await.unwrap();

        assert_eq!(
            runner.count(AndroidTool::Adb, "input swipe 48000000 1200 12000000 1200 300"),
            1
        );
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("right".parse::<Direction>().unwrap(), Direction::Right);
        assert!("Right".parse::<Direction>().is_err());
        assert!(" up ".parse::<Direction>().is_err());
        assert!(matches!(
            "diagonal".parse::<Direction>(),
            Err(GestureError::UnsupportedDirection(ref d)) if d == "diagonal"
        ));
        assert!("".parse::<Direction>().is_err());
    }

    #[tokio::test]
    async fn test_swipe_issues_single_input_command() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(AndroidTool::Adb, "wm size", "Physical size: 1080x2400\n")
                .on(AndroidTool::Adb, "wm density", "Physical density: 420\n")
                .on(AndroidTool::Adb, "input swipe", ""),
        );
        let gestures = GestureSynthesizer::new(AdbClient::new(runner.clone()));

        gestures.swipe(5554, "up").await.unwrap();

        assert_eq!(runner.count(AndroidTool::Adb, "input swipe 540 1920 540 480 300"), 1);
        assert_eq!(runner.count(AndroidTool::Adb, "input swipe"), 1);
    }

    #[tokio::test]
    async fn test_unsupported_direction_issues_no_command() {
        let runner = Arc::new(ScriptedRunner::new());
        let gestures = GestureSynthesizer::new(AdbClient::new(runner.clone()));

        let err = gestures.swipe(5554, "diagonal").await.unwrap_err();

        assert!(matches!(err, GestureError::UnsupportedDirection(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_size_is_reported() {
        let runner = Arc::new(ScriptedRunner::new().on(AndroidTool::Adb, "wm size", "\n"));
        let gestures = GestureSynthesizer::new(AdbClient::new(runner.clone()));

        let err = gestures.swipe(5554, "down").await.unwrap_err();

        assert!(matches!(err, GestureError::GeometryUnavailable { port: 5554 }));
        assert_eq!(runner.count(AndroidTool::Adb, "input swipe"), 0);
    }

    #[tokio::test]
    async fn test_input_failure_wraps_tool_error() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(AndroidTool::Adb, "wm size", "Physical size: 720x1280\n")
                .on_fail(AndroidTool::Adb, "input swipe", "error: closed"),
        );
        let gestures = GestureSynthesizer::new(AdbClient::new(runner));

        let err = gestures.swipe(5554, "left").await.unwrap_err();
        assert!(matches!(err, GestureError::Tool { port: 5554, .. }));
        assert!(err.to_string().contains("error: closed"));
    }
}
