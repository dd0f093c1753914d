//! Async plumbing: one actor per connected player, staggered dialogue
//! playback, and the collaborator traits effects are delivered through.

pub mod dialogue;
pub mod director;
pub mod executor;
pub mod ports;
