//! Time-synchronized kinematics and impact event engine
//!
//! Drives a scrubbable asteroid-impact visualization from a single simulation
//! clock: trajectory sampling, body rotation, impact detection, the frozen
//! frame that pins the crater to the rotating surface, effect lifecycles and
//! the orbital path.  Every per-frame output is a function of the clock value
//! and the loaded data, so scrubbing and playback agree frame for frame.

pub mod asteroid;
pub mod clock;
pub mod config;
pub mod constants;
pub mod effects;
pub mod engine;
pub mod error;
pub mod frozen_frame;
pub mod geo;
pub mod impact;
pub mod orbit;
pub mod rotation;
pub mod scenario;
pub mod simulation;
pub mod testing;
pub mod trajectory;
