use serde::{Deserialize, Serialize};

use super::blobs::RowCandidates;

/// 种子选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// First candidate of the topmost non-empty row.
    #[default]
    FirstNonEmpty,
    /// First candidate of the last non-empty row visited by the seeding scan.
    /// Matches the legacy rover firmware.
    LastVisited,
}

/// 工作网格坐标下的线点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub x: f32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackState {
    Unseeded,
    Tracking { current_x: f32, delta_x: f32 },
}

impl TrackState {
    pub fn seeded(x: f32) -> Self {
        TrackState::Tracking {
            current_x: x,
            delta_x: 0.0,
        }
    }

    pub fn predicted(&self) -> Option<f32> {
        match self {
            TrackState::Unseeded => None,
            TrackState::Tracking { current_x, delta_x } => Some(current_x + delta_x),
        }
    }

    /// 处理一行候选，返回新状态和被选中的位置
    ///
    /// An empty row leaves the state untouched so the next prediction still
    /// extrapolates from the last accepted row.
    pub fn transition(&self, candidates: &[f32]) -> (TrackState, Option<f32>) {
        match self {
            TrackState::Unseeded => (TrackState::Unseeded, None),
            TrackState::Tracking { current_x, delta_x } => {
                match nearest(candidates, current_x + delta_x) {
                    Some(selected) => (
                        TrackState::Tracking {
                            current_x: selected,
                            delta_x: selected - current_x,
                        },
                        Some(selected),
                    ),
                    None => (*self, None),
                }
            }
        }
    }
}

/// Leftmost candidate wins ties (strict `<`).
fn nearest(candidates: &[f32], target: f32) -> Option<f32> {
    let mut best: Option<(f32, f32)> = None;
    for &c in candidates {
        let dist = (c - target).abs();
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((c, dist)),
        }
    }
    best.map(|(c, _)| c)
}

/// 连续性约束的逐行跟踪器，状态只在一帧内有效
pub struct LineTracker {
    state: TrackState,
    policy: SeedPolicy,
}

impl LineTracker {
    pub fn new() -> Self {
        Self::with_policy(SeedPolicy::default())
    }

    pub fn with_policy(policy: SeedPolicy) -> Self {
        Self {
            state: TrackState::Unseeded,
            policy,
        }
    }

    pub fn seed(&self, rows: &[RowCandidates]) -> Option<f32> {
        let mut non_empty = rows.iter().filter_map(|c| c.first().copied());
        match self.policy {
            SeedPolicy::FirstNonEmpty => non_empty.next(),
            SeedPolicy::LastVisited => non_empty.last(),
        }
    }

    /// Resets, seeds, then walks every row in order. Rows without candidates
    /// produce no point.
    pub fn track(&mut self, rows: &[RowCandidates]) -> Vec<LinePoint> {
        self.reset();

        let Some(seed) = self.seed(rows) else {
            return Vec::new();
        };
        self.state = TrackState::seeded(seed);

        let mut points = Vec::new();
        for (y, candidates) in rows.iter().enumerate() {
            let (next, selected) = self.state.transition(candidates);
            self.state = next;
            if let Some(x) = selected {
                points.push(LinePoint { x, y: y as u32 });
            }
        }
        points
    }

    pub fn current_state(&self) -> &TrackState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = TrackState::Unseeded;
    }
}

impl Default for LineTracker {
    fn default() -> Self {
        Self::new()
    }
}
