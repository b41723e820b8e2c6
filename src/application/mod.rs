//! Application layer - The dictation controller and port interfaces
//!
//! Contains the core orchestration logic and trait definitions
//! for external system interactions.

pub mod controller;
pub mod events;
pub mod ports;

// Re-export the controller surface
pub use controller::{
    ControllerError, ControllerSnapshot, DictationController, PlaybackSnapshot,
};
pub use events::{ControllerEvent, TranscriptFragment};
