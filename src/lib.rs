//! Headless core of the ideaspace mind-map canvas.
//!
//! Ideas are circles on a scrollable workspace. [`physics::Engine`] keeps them
//! apart and lets them drift to rest after a drag; [`workspace::Workspace`]
//! adds connections, hit-testing, drag momentum and placement of generated
//! ideas. The JavaScript view drives everything through [`wasm::IdeaCanvas`]
//! and redraws from the JSON frames it returns.

pub mod config;
pub mod error;
pub mod output;
pub mod physics;
pub mod wasm;
pub mod workspace;

pub use config::{BroadphaseConfig, PhysicsConfig};
pub use error::{Error, Result};
pub use physics::{Body, Boundary, Engine, EngineEvent, NodeId, NodePosition, V2};
pub use workspace::{Connection, Segment, Workspace};
