// Engine module - scene building blocks and the trail-ribbon pipeline

pub mod camera;
pub mod components;
pub mod debug_overlay;
pub mod effect;
pub mod grass;
pub mod ground;
pub mod input;
pub mod mesh;
pub mod player;
pub mod render;
pub mod ribbon;
pub mod shaders;
pub mod spawn;
pub mod systems;
pub mod trail;

// Re-export commonly used items
pub use components::*;
pub use effect::{MotionSample, RibbonSink, TrailConfig, TrailEffect, TrailVariant};
pub use grass::GrassConfig;
pub use ground::GroundConfig;
pub use player::PlayerConfig;
pub use systems::SwarmConfig;
