// Trail effect: one configurable component behind every ribbon variant.
//
//   sample → TrailHistory::record/prune → RibbonBuilder → RibbonBuffer → RibbonSink
//
// Phases:
//   Idle:     fewer than 2 points, nothing drawn
//   Active:   ≥2 points, rebuilt every `rebuild_interval` ticks
//   Disabled: switched off externally, history cleared, sink drawing nothing
//
// Samples are recorded every tick even when the rebuild is subsampled.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use super::ribbon::{RibbonBuffer, RibbonBuilder, RibbonOutput, RibbonStyle, RibbonVertex};
use super::spawn::SpawnPattern;
use super::trail::TrailHistory;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub ribbon_count: usize,
    pub spawn_pattern: SpawnPattern,
    pub spawn_radius: f32,
    pub width: f32,
    pub color: [f32; 3],
    /// Seconds a trail point survives.
    pub lifetime: f32,
    pub movement_threshold: f32,
    pub max_points: usize,
    /// Rebuild geometry every Nth tick (1 = every frame).
    pub rebuild_interval: u32,
    /// Ignore the source velocity and derive it from successive positions.
    pub derive_velocity: bool,
    pub fade_floor: f32,
    pub fade_rate: f32,
    pub taper: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        TrailVariant::default().config()
    }
}

impl TrailConfig {
    pub fn style(&self) -> RibbonStyle {
        RibbonStyle {
            width: self.width,
            color: self.color,
            fade_floor: self.fade_floor,
            fade_rate: self.fade_rate,
            taper: self.taper,
        }
    }

    /// Segments needed to hold every ribbon of a full-length trail.
    pub fn segment_capacity(&self) -> usize {
        self.ribbon_count * self.max_points.saturating_sub(1)
    }
}

/// Named presets for the four ribbon looks the scene offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TrailVariant {
    /// Single centre ribbon, rebuilt every other frame.
    #[default]
    Optimized,
    /// Static ring of ribbons, rebuilt every frame.
    Proper,
    /// Thin velocity-oriented streaks, velocity derived from motion.
    SpeedTrails,
    /// Wide velocity-oriented ribbons.
    SpeedRibbons,
}

impl TrailVariant {
    pub const ALL: [TrailVariant; 4] = [
        TrailVariant::Optimized,
        TrailVariant::Proper,
        TrailVariant::SpeedTrails,
        TrailVariant::SpeedRibbons,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrailVariant::Optimized => "Optimized ribbons",
            TrailVariant::Proper => "Proper ribbons",
            TrailVariant::SpeedTrails => "Speed trails",
            TrailVariant::SpeedRibbons => "Speed ribbons",
        }
    }

    pub fn config(&self) -> TrailConfig {
        let base = TrailConfig {
            ribbon_count: 1,
            spawn_pattern: SpawnPattern::Center,
            spawn_radius: 0.0,
            width: 0.35,
            color: [0.45, 0.85, 1.0],
            lifetime: 1.2,
            movement_threshold: 0.05,
            max_points: 60,
            rebuild_interval: 1,
            derive_velocity: false,
            fade_floor: 0.1,
            fade_rate: 0.8,
            taper: 0.5,
        };
        match self {
            TrailVariant::Optimized => TrailConfig { rebuild_interval: 2, ..base },
            TrailVariant::Proper => TrailConfig {
                ribbon_count: 4,
                spawn_pattern: SpawnPattern::StaticRing,
                spawn_radius: 0.35,
                width: 0.15,
                color: [1.0, 0.55, 0.9],
                ..base
            },
            TrailVariant::SpeedTrails => TrailConfig {
                ribbon_count: 6,
                spawn_pattern: SpawnPattern::VelocityRing,
                spawn_radius: 0.4,
                width: 0.05,
                color: [1.0, 0.9, 0.5],
                lifetime: 0.6,
                max_points: 30,
                derive_velocity: true,
                fade_floor: 0.05,
                fade_rate: 1.0,
                taper: 0.9,
                ..base
            },
            TrailVariant::SpeedRibbons => TrailConfig {
                ribbon_count: 3,
                spawn_pattern: SpawnPattern::VelocityRing,
                spawn_radius: 0.3,
                width: 0.25,
                color: [0.5, 1.0, 0.6],
                lifetime: 0.9,
                max_points: 40,
                derive_velocity: true,
                ..base
            },
        }
    }
}

// ============================================================================
// SINK
// ============================================================================

/// Receives rebuilt ribbon geometry. The GPU renderer implements this; so do tests.
pub trait RibbonSink {
    /// Replace the displayed geometry with `vertices` / `indices`.
    fn upload(&mut self, vertices: &[RibbonVertex], indices: &[u32]);
    /// Draw nothing until the next upload.
    fn clear(&mut self);
}

// ============================================================================
// EFFECT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailPhase {
    Idle,
    Active,
    Disabled,
}

/// Position (and optionally velocity) of the trail source for one frame.
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    pub position: Vec3,
    pub velocity: Option<Vec3>,
}

pub struct TrailEffect {
    config:  TrailConfig,
    history: TrailHistory,
    builder: RibbonBuilder,
    buffer:  RibbonBuffer,
    phase:   TrailPhase,
    ticks:   u64,
    /// Previous sample (position, time) for finite-difference velocity.
    previous: Option<(Vec3, f32)>,
}

impl TrailEffect {
    pub fn new(config: TrailConfig) -> Self {
        let history = TrailHistory::new(config.max_points, config.lifetime, config.movement_threshold);
        let buffer = RibbonBuffer::with_segment_capacity(config.segment_capacity());
        Self {
            config,
            history,
            builder: RibbonBuilder::new(),
            buffer,
            phase: TrailPhase::Idle,
            ticks: 0,
            previous: None,
        }
    }

    pub fn config(&self) -> &TrailConfig { &self.config }
    pub fn phase(&self) -> TrailPhase { self.phase }
    pub fn point_count(&self) -> usize { self.history.len() }
    /// Newest recorded position, where every ribbon starts.
    pub fn head(&self) -> Option<Vec3> { self.history.newest().map(|p| p.position) }
    pub fn vertex_count(&self) -> usize { self.buffer.vertex_count() }
    pub fn index_count(&self) -> usize { self.buffer.index_count() }

    /// Advance one frame. `enabled` is the external on/off switch, read every tick.
    pub fn tick(
        &mut self,
        sample: MotionSample,
        now: f32,
        enabled: bool,
        sink: &mut impl RibbonSink,
    ) -> TrailPhase {
        if !enabled {
            if self.phase != TrailPhase::Disabled {
                self.history.clear();
                self.previous = None;
                self.buffer.reset();
                sink.clear();
                self.phase = TrailPhase::Disabled;
            }
            return self.phase;
        }

        let velocity = self.sample_velocity(&sample, now);
        self.history.record(sample.position, velocity, now);
        self.history.prune(now);
        self.ticks += 1;

        if self.history.len() < 2 {
            if self.phase == TrailPhase::Active {
                self.buffer.reset();
                sink.clear();
            }
            self.phase = TrailPhase::Idle;
            return self.phase;
        }

        let entering = self.phase != TrailPhase::Active;
        self.phase = TrailPhase::Active;

        let interval = self.config.rebuild_interval.max(1) as u64;
        if entering || self.ticks % interval == 0 {
            self.builder.build(
                &self.history,
                self.config.spawn_pattern,
                self.config.ribbon_count,
                self.config.spawn_radius,
                now,
                &self.config.style(),
                &mut self.buffer,
            );
            sink.upload(self.buffer.vertices(), self.buffer.indices());
        }
        self.phase
    }

    fn sample_velocity(&mut self, sample: &MotionSample, now: f32) -> Vec3 {
        let derived = match self.previous {
            Some((position, time)) if now > time => (sample.position - position) / (now - time),
            _ => Vec3::ZERO,
        };
        self.previous = Some((sample.position, now));

        match sample.velocity {
            Some(v) if !self.config.derive_velocity => v,
            _ => derived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        uploads: usize,
        clears:  usize,
        vertices: usize,
        indices:  usize,
    }

    impl RibbonSink for RecordingSink {
        fn upload(&mut self, vertices: &[RibbonVertex], indices: &[u32]) {
            self.uploads += 1;
            self.vertices = vertices.len();
            self.indices = indices.len();
        }

        fn clear(&mut self) {
            self.clears += 1;
            self.vertices = 0;
            self.indices = 0;
        }
    }

    fn at(z: f32) -> MotionSample {
        MotionSample { position: Vec3::new(0.0, 0.0, z), velocity: Some(Vec3::Z) }
    }

    fn single_ribbon() -> TrailConfig {
        TrailConfig { lifetime: 1.0, ..TrailVariant::Proper.config() }
            .with_single_ribbon()
    }

    impl TrailConfig {
        fn with_single_ribbon(self) -> Self {
            TrailConfig { ribbon_count: 1, spawn_pattern: SpawnPattern::Center, ..self }
        }
    }

    #[test]
    fn test_idle_until_two_points() {
        let mut effect = TrailEffect::new(single_ribbon());
        let mut sink = RecordingSink::default();
        assert_eq!(effect.phase(), TrailPhase::Idle);
        assert_eq!(effect.tick(at(0.0), 0.0, true, &mut sink), TrailPhase::Idle);
        assert_eq!(sink.uploads, 0);
        assert_eq!(effect.tick(at(1.0), 0.1, true, &mut sink), TrailPhase::Active);
        assert_eq!(sink.uploads, 1);
        assert_eq!(sink.vertices, 4);
        assert_eq!(sink.indices, 6);
    }

    #[test]
    fn test_five_samples_build_four_segments() {
        let mut effect = TrailEffect::new(single_ribbon());
        let mut sink = RecordingSink::default();
        for i in 0..5 {
            effect.tick(at(i as f32), i as f32 * 0.1, true, &mut sink);
        }
        assert_eq!(effect.point_count(), 5);
        assert_eq!(sink.vertices, 16);
        assert_eq!(sink.indices, 24);
    }

    #[test]
    fn test_disable_clears_and_reenable_recovers() {
        let mut effect = TrailEffect::new(single_ribbon());
        let mut sink = RecordingSink::default();
        effect.tick(at(0.0), 0.0, true, &mut sink);
        effect.tick(at(1.0), 0.1, true, &mut sink);

        assert_eq!(effect.tick(at(2.0), 0.2, false, &mut sink), TrailPhase::Disabled);
        assert_eq!(effect.point_count(), 0);
        assert_eq!(effect.vertex_count(), 0);
        assert_eq!(sink.clears, 1);
        assert_eq!(sink.indices, 0);

        // Staying disabled does not clear again
        effect.tick(at(3.0), 0.3, false, &mut sink);
        assert_eq!(sink.clears, 1);

        assert_eq!(effect.tick(at(4.0), 0.4, true, &mut sink), TrailPhase::Idle);
        assert_eq!(effect.tick(at(5.0), 0.5, true, &mut sink), TrailPhase::Active);
        assert_eq!(sink.vertices, 4);
    }

    #[test]
    fn test_active_falls_back_to_idle_when_trail_expires() {
        let mut effect = TrailEffect::new(single_ribbon());
        let mut sink = RecordingSink::default();
        effect.tick(at(0.0), 0.0, true, &mut sink);
        effect.tick(at(1.0), 0.1, true, &mut sink);
        // Source stops: the same position is not re-recorded, old points expire
        assert_eq!(effect.tick(at(1.0), 5.0, true, &mut sink), TrailPhase::Idle);
        assert_eq!(sink.clears, 1);
        assert_eq!(effect.point_count(), 0);
    }

    #[test]
    fn test_rebuild_interval_subsamples_uploads() {
        let config = TrailConfig { rebuild_interval: 3, ..single_ribbon() };
        let mut effect = TrailEffect::new(config);
        let mut sink = RecordingSink::default();
        for i in 0..10 {
            effect.tick(at(i as f32), i as f32 * 0.01, true, &mut sink);
        }
        // Recorded every tick
        assert_eq!(effect.point_count(), 10);
        // Uploads on entering Active (tick 2) then on ticks 3, 6, 9
        assert_eq!(sink.uploads, 4);
    }

    #[test]
    fn test_derived_velocity_orients_ring() {
        let config = TrailConfig {
            spawn_pattern: SpawnPattern::VelocityRing,
            ribbon_count: 2,
            derive_velocity: true,
            ..single_ribbon()
        };
        let mut effect = TrailEffect::new(config);
        let mut sink = RecordingSink::default();
        // Supplied velocity is bogus; the derived one is +X at 10 units/s
        let sample = |x: f32| MotionSample { position: Vec3::new(x, 0.0, 0.0), velocity: Some(Vec3::Y * 100.0) };
        effect.tick(sample(0.0), 0.0, true, &mut sink);
        effect.tick(sample(1.0), 0.1, true, &mut sink);
        let newest = effect.history.newest().map(|p| p.velocity);
        let v = newest.unwrap_or(Vec3::ZERO);
        assert!((v - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_head_follows_newest_sample() {
        let mut effect = TrailEffect::new(single_ribbon());
        let mut sink = RecordingSink::default();
        assert_eq!(effect.head(), None);
        effect.tick(at(0.0), 0.0, true, &mut sink);
        effect.tick(at(2.0), 0.1, true, &mut sink);
        assert_eq!(effect.head(), Some(Vec3::new(0.0, 0.0, 2.0)));
        effect.tick(at(3.0), 0.2, false, &mut sink);
        assert_eq!(effect.head(), None);
    }

    #[test]
    fn test_missing_velocity_is_derived() {
        let mut effect = TrailEffect::new(single_ribbon());
        let mut sink = RecordingSink::default();
        let sample = |z: f32| MotionSample { position: Vec3::new(0.0, 0.0, z), velocity: None };
        effect.tick(sample(0.0), 1.0, true, &mut sink);
        assert_eq!(effect.history.newest().map(|p| p.velocity), Some(Vec3::ZERO));
        effect.tick(sample(0.5), 1.5, true, &mut sink);
        assert_eq!(effect.history.newest().map(|p| p.velocity), Some(Vec3::Z));
    }

    #[test]
    fn test_pooled_capacity_covers_full_trail() {
        for variant in TrailVariant::ALL {
            let config = variant.config();
            let mut effect = TrailEffect::new(config.clone());
            let mut sink = RecordingSink::default();
            for i in 0..(config.max_points * 2) {
                let t = i as f32 * 0.001;
                let sample = MotionSample { position: Vec3::new(i as f32, 0.0, 0.0), velocity: Some(Vec3::X) };
                effect.tick(sample, t, true, &mut sink);
            }
            assert_eq!(effect.point_count(), config.max_points, "{variant:?}");
            assert_eq!(sink.vertices, config.segment_capacity() * 4, "{variant:?}");
        }
    }

    #[test]
    fn test_variant_presets() {
        assert_eq!(TrailConfig::default(), TrailVariant::Optimized.config());
        assert_eq!(TrailVariant::Optimized.config().rebuild_interval, 2);
        assert!(TrailVariant::SpeedTrails.config().derive_velocity);
        assert_eq!(TrailVariant::Proper.config().spawn_pattern, SpawnPattern::StaticRing);
        for variant in TrailVariant::ALL {
            let config = variant.config();
            assert!(config.max_points >= 2);
            assert!(config.lifetime > 0.0);
        }
    }
}
