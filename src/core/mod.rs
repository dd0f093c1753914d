pub mod buttons;
pub mod calculator;
pub mod checkpoint;
pub mod clock;
pub mod content;
pub mod engine;
pub(crate) mod guard;
pub mod guide;
pub mod manifest;
pub mod phase;
pub mod progress;
pub mod prompt;
pub mod rooms;
pub mod selection;
pub mod template;
