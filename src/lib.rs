//! ShiftScribe - voice-dictated shift notes with AI handover reports
//!
//! This crate records shift notes from the microphone with live
//! transcription, lets the operator review the recording before
//! confirming, and submits the confirmed notes to a remote handover
//! summarization service.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: The dictation controller and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, Gemini, rodio, HTTP)
//! - **CLI**: Command-line interface, the interactive dictation loop

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
