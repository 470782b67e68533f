//! Tile-grid raycasting renderer: a 2D map of walls, doors, floors and ceilings drawn as a
//! first-person view, with billboard sprites and a small phase machine around a playthrough.

pub mod config;
pub mod game;
pub mod host;
pub mod map;
pub mod pose;
pub mod project;
pub mod ray;
pub mod render;
pub mod sprite;
pub mod texture;

pub use config::Config;
pub use game::{Phase, Session, Trigger};
pub use host::{Action, Assets, Canvas, Framebuffer, Input};
pub use map::Level;
pub use pose::Pose;
