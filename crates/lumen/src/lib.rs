//! # LUMEN
//!
//! Application shell over the `lumen_ecs` entity-component store.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       GameLoop                       │
//! │   systems: [MovementSystem, ...]   stats, timing     │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ FrameContext (per frame)
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                        Scene                         │
//! │   ┌───────────────────┐      ┌───────────────────┐   │
//! │   │ Registry          │      │ InputState        │   │
//! │   │ (lumen_ecs)       │      │ cursor, toggles   │   │
//! │   └───────────────────┘      └───────────────────┘   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `input`: cursor position and display toggles of a scene
//! - `scene`: a registry with the built-in components, plus input state
//! - `game_loop`: systems, frame orchestration and timing

pub mod error;
pub mod game_loop;
pub mod input;
pub mod scene;

// Re-export the store
pub use lumen_ecs as ecs;

pub use error::{SceneError, SceneResult};
pub use game_loop::{
    FrameContext, FrameStats, FrameStatsAccumulator, GameLoop, GameLoopConfig, MovementSystem,
    System,
};
pub use input::{InputCommand, InputState, Key, KeyAction};
pub use scene::{BuiltinComponents, Renderable, Scene};
