//! # LUMEN Game Loop
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME                                                      │
//! │    └─ Measure and clamp delta time                                  │
//! │                                                                     │
//! │ 2. SYSTEMS (registration order)                                     │
//! │    └─ Each system gets a FrameContext over the scene                │
//! │                                                                     │
//! │ 3. END FRAME                                                        │
//! │    └─ Record timing, warn on slow frames                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use lumen_ecs::{ComponentHandle, Position, Registry, Velocity};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SceneError, SceneResult};
use crate::input::InputState;
use crate::scene::Scene;

/// Configuration for the game loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameLoopConfig {
    /// Target frames per second.
    pub target_fps: u32,
    /// Upper bound on delta time, in seconds.
    pub max_delta_secs: f32,
    /// Enable frame timing logs.
    pub enable_timing_logs: bool,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_delta_secs: 0.1,
            enable_timing_logs: false,
        }
    }
}

impl GameLoopConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidConfig`] on parse errors or bad values.
    pub fn from_toml_str(source: &str) -> SceneResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| SceneError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`SceneError::ConfigIo`] if the file cannot be read, otherwise as for
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| SceneError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> SceneResult<()> {
        if self.target_fps == 0 {
            return Err(SceneError::InvalidConfig(
                "target_fps must be at least 1".to_owned(),
            ));
        }
        if !(self.max_delta_secs.is_finite() && self.max_delta_secs > 0.0) {
            return Err(SceneError::InvalidConfig(format!(
                "max_delta_secs must be positive, got {}",
                self.max_delta_secs
            )));
        }
        Ok(())
    }

    /// Returns the frame budget.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    /// Returns the fixed delta time of one frame at the target rate.
    #[must_use]
    pub fn fixed_delta(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Time spent in systems in microseconds.
    pub systems_us: u64,
    /// Frame number.
    pub frame: u64,
    /// Number of systems run.
    pub systems_run: u32,
    /// Alive entities at the end of the frame.
    pub alive_entities: usize,
}

/// Per-frame view handed to each system.
pub struct FrameContext<'a> {
    /// The scene registry.
    pub registry: &'a mut Registry,
    /// The scene input state.
    pub input: &'a InputState,
    /// Current frame number.
    pub frame: u64,
    /// Delta time since the last frame, in seconds.
    pub delta_time: f32,
}

/// Logic run once per frame.
pub trait System {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Runs the system for one frame.
    ///
    /// # Errors
    ///
    /// Any registry error; the loop wraps it with the system name.
    fn run(&mut self, ctx: &mut FrameContext<'_>) -> lumen_ecs::EcsResult<()>;
}

/// Integrates `Position` by `Velocity * delta_time` for every entity that
/// owns both.
#[derive(Clone, Copy, Debug)]
pub struct MovementSystem {
    position: ComponentHandle<Position>,
    velocity: ComponentHandle<Velocity>,
}

impl MovementSystem {
    /// Creates the system from the component handles it moves.
    #[must_use]
    pub const fn new(
        position: ComponentHandle<Position>,
        velocity: ComponentHandle<Velocity>,
    ) -> Self {
        Self { position, velocity }
    }

    /// Creates the system for a scene's built-in components.
    #[must_use]
    pub const fn for_scene(scene: &Scene) -> Self {
        let builtins = scene.builtins();
        Self::new(builtins.position, builtins.velocity)
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn run(&mut self, ctx: &mut FrameContext<'_>) -> lumen_ecs::EcsResult<()> {
        let moving: Vec<_> = ctx
            .registry
            .entities_with(&[self.position.id(), self.velocity.id()])?
            .collect();

        for entity in moving {
            let Some(&velocity) = ctx.registry.get_as(entity, self.velocity)? else {
                continue;
            };
            if let Some(position) = ctx.registry.get_as_mut(entity, self.position)? {
                position.x += velocity.x * ctx.delta_time;
                position.y += velocity.y * ctx.delta_time;
                position.z += velocity.z * ctx.delta_time;
            }
        }
        Ok(())
    }
}

/// The frame orchestrator.
///
/// Owns the systems; the scene is passed in per frame.
pub struct GameLoop {
    /// Systems in run order.
    systems: Vec<Box<dyn System>>,
    /// Configuration.
    config: GameLoopConfig,
    /// Frame counter.
    frame_count: u64,
    /// Last frame start time.
    last_frame_time: Instant,
    /// Accumulated frame statistics.
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a game loop with no systems.
    #[must_use]
    pub fn new(config: GameLoopConfig) -> Self {
        Self {
            systems: Vec::new(),
            config,
            frame_count: 0,
            last_frame_time: Instant::now(),
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Appends a system; systems run in the order they were added.
    pub fn add_system(&mut self, system: impl System + 'static) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Returns the number of systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs one frame with the wall-clock delta since the previous frame,
    /// clamped to `max_delta_secs`.
    ///
    /// # Errors
    ///
    /// [`SceneError::System`] for the first failing system; later systems do
    /// not run that frame.
    pub fn tick(&mut self, scene: &mut Scene) -> SceneResult<FrameStats> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;

        // Long pauses must not turn into one huge step
        let delta_time = delta.as_secs_f32().min(self.config.max_delta_secs);
        self.tick_with_delta(scene, delta_time)
    }

    /// Runs one frame with an explicit delta time.
    ///
    /// # Errors
    ///
    /// As for [`tick`](Self::tick).
    pub fn tick_with_delta(
        &mut self,
        scene: &mut Scene,
        delta_time: f32,
    ) -> SceneResult<FrameStats> {
        let frame_start = Instant::now();
        let frame = self.frame_count;
        let (registry, input) = scene.parts_mut();

        let mut ctx = FrameContext {
            registry,
            input,
            frame,
            delta_time,
        };
        let mut systems_run = 0u32;
        for system in &mut self.systems {
            system
                .run(&mut ctx)
                .map_err(|source| SceneError::System {
                    system: system.name(),
                    frame,
                    source,
                })?;
            systems_run += 1;
        }
        let systems_us = frame_start.elapsed().as_micros() as u64;

        let stats = FrameStats {
            total_us: frame_start.elapsed().as_micros() as u64,
            systems_us,
            frame,
            systems_run,
            alive_entities: scene.registry().alive_count(),
        };
        self.end_frame(stats);
        Ok(stats)
    }

    /// Ends the current frame.
    ///
    /// Records timing and prepares for next frame.
    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats, self.config.frame_budget());

        let budget = self.config.frame_budget();
        if self.config.enable_timing_logs && stats.total_us > budget.as_micros() as u64 {
            warn!(
                frame = stats.frame,
                total_ms = stats.total_us as f64 / 1000.0,
                budget_ms = budget.as_micros() as f64 / 1000.0,
                "frame exceeded budget"
            );
        }
        debug!(frame = stats.frame, systems = stats.systems_run, "frame complete");
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GameLoopConfig {
        &self.config
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of system times.
    pub systems_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            systems_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records a frame's statistics against a frame budget.
    pub fn record(&mut self, stats: FrameStats, budget: Duration) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.systems_us_sum += stats.systems_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > budget.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
