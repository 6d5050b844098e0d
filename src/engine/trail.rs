// Trail history: a bounded, time-stamped record of where a moving point has been.
//
// Two independent eviction policies:
//   - count: checked on insert, oldest points dropped past `max_points`
//   - age:   checked every frame in prune(), points at or past `lifetime` dropped
//
// Points are stored newest-first (front of the deque = most recent sample).

use std::collections::VecDeque;
use glam::Vec3;

// ============================================================================
// TRAIL POINT
// ============================================================================

/// One sample of a moving point. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position:  Vec3,
    pub velocity:  Vec3,
    /// Monotonic time in seconds at which the sample was taken.
    pub timestamp: f32,
}

impl TrailPoint {
    pub fn age(&self, now: f32) -> f32 {
        now - self.timestamp
    }
}

// ============================================================================
// TRAIL HISTORY
// ============================================================================

pub struct TrailHistory {
    points: VecDeque<TrailPoint>,
    pub max_points: usize,
    /// Seconds a point survives before prune() discards it.
    pub lifetime: f32,
    /// Minimum distance from the newest point before a new sample is accepted.
    /// Stops jitter from flooding the buffer while the source stands still.
    pub movement_threshold: f32,
}

impl TrailHistory {
    pub fn new(max_points: usize, lifetime: f32, movement_threshold: f32) -> Self {
        Self {
            points: VecDeque::with_capacity(max_points + 1),
            max_points,
            lifetime,
            movement_threshold,
        }
    }

    /// Push a sample to the front if it moved far enough from the newest point.
    /// Returns true when a point was appended.
    pub fn record(&mut self, position: Vec3, velocity: Vec3, time: f32) -> bool {
        if let Some(newest) = self.points.front() {
            if newest.position.distance(position) <= self.movement_threshold {
                return false;
            }
        }

        self.points.push_front(TrailPoint { position, velocity, timestamp: time });
        self.points.truncate(self.max_points);
        true
    }

    /// Drop every point whose age has reached the lifetime, then enforce the length cap.
    /// Ages grow toward the back, so expired points are always a suffix.
    pub fn prune(&mut self, time: f32) {
        while let Some(oldest) = self.points.back() {
            if oldest.age(time) >= self.lifetime {
                self.points.pop_back();
            } else {
                break;
            }
        }
        self.points.truncate(self.max_points);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn newest(&self) -> Option<&TrailPoint> {
        self.points.front()
    }

    /// Iterate newest → oldest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TrailPoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> TrailHistory {
        TrailHistory::new(8, 1.0, 0.05)
    }

    #[test]
    fn test_first_sample_always_recorded() {
        let mut h = history();
        assert!(h.record(Vec3::ZERO, Vec3::ZERO, 0.0));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_record_ignores_movement_within_threshold() {
        let mut h = history();
        h.record(Vec3::ZERO, Vec3::ZERO, 0.0);
        assert!(!h.record(Vec3::new(0.05, 0.0, 0.0), Vec3::ZERO, 0.1));
        assert!(!h.record(Vec3::new(0.0, 0.01, 0.0), Vec3::ZERO, 0.2));
        assert_eq!(h.len(), 1);
        assert!(h.record(Vec3::new(0.2, 0.0, 0.0), Vec3::ZERO, 0.3));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_newest_point_is_at_front() {
        let mut h = history();
        h.record(Vec3::ZERO, Vec3::ZERO, 0.0);
        h.record(Vec3::X, Vec3::ZERO, 0.1);
        assert_eq!(h.newest().map(|p| p.position), Some(Vec3::X));
    }

    #[test]
    fn test_length_never_exceeds_max() {
        let mut h = history();
        for i in 0..100 {
            h.record(Vec3::new(i as f32, 0.0, 0.0), Vec3::ZERO, i as f32 * 0.001);
            assert!(h.len() <= h.max_points);
        }
        assert_eq!(h.len(), 8);
        // Oldest were discarded: the survivors are the last eight samples
        assert_eq!(h.iter().last().map(|p| p.position.x), Some(92.0));
    }

    #[test]
    fn test_timestamps_non_decreasing_in_insertion_order() {
        let mut h = history();
        for i in 0..6 {
            h.record(Vec3::new(i as f32, 0.0, 0.0), Vec3::ZERO, i as f32 * 0.1);
        }
        // newest-first storage means timestamps are non-increasing front to back
        let stamps: Vec<f32> = h.iter().map(|p| p.timestamp).collect();
        for pair in stamps.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_prune_removes_expired_points() {
        let mut h = history();
        for i in 0..5 {
            h.record(Vec3::new(i as f32, 0.0, 0.0), Vec3::ZERO, i as f32 * 0.25);
        }
        // now = 1.25: ages are 1.25, 1.0, 0.75, 0.5, 0.25
        h.prune(1.25);
        assert_eq!(h.len(), 3);
        for p in h.iter() {
            assert!(p.age(1.25) < h.lifetime);
        }
    }

    #[test]
    fn test_prune_everything_when_all_expired() {
        let mut h = history();
        h.record(Vec3::ZERO, Vec3::ZERO, 0.0);
        h.record(Vec3::X, Vec3::ZERO, 0.1);
        h.prune(5.0);
        assert!(h.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut h = history();
        h.record(Vec3::ZERO, Vec3::ZERO, 0.0);
        h.clear();
        assert!(h.is_empty());
        assert!(h.newest().is_none());
    }
}
