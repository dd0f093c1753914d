/// The front-end surfaces the runtime writes to.
///
/// Every call is fire-and-forget from the engine's point of view: the
/// executor logs a failed call and moves on.

use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::info;

use crate::schema::journey::JourneyId;
use crate::schema::player::PlayerId;
use crate::schema::region::BlockPos;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("display '{0}' not found")]
    UnknownDisplay(String),
    #[error("destination '{0}' not found")]
    UnknownDestination(String),
    #[error("player {0} is not connected")]
    Disconnected(u64),
    #[error("{0}")]
    Other(String),
}

pub trait ChatSink: Send + Sync {
    fn send(&self, player: PlayerId, line: &str) -> Result<(), PortError>;
}

pub trait DisplayUpdater: Send + Sync {
    fn set_display(&self, display: &str, lines: &[String; 4]) -> Result<(), PortError>;
    fn set_indicator(&self, indicator: &str, lit: bool) -> Result<(), PortError>;
}

pub trait Transport: Send + Sync {
    fn teleport(&self, player: PlayerId, destination: &str) -> Result<(), PortError>;
    /// `None` puts the guide next to the player.
    fn move_guide(&self, player: PlayerId, anchor: Option<BlockPos>) -> Result<(), PortError>;
}

/// Study telemetry. Never affects control flow.
pub trait EventLogger: Send + Sync {
    fn log_miss(&self, session_id: &str, context: &str);
    fn log_hint(&self, session_id: &str, context: &str);
    fn log_completion(&self, session_id: &str, journey: JourneyId);
}

/// Writes study events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLogger for TracingEventLog {
    fn log_miss(&self, session_id: &str, context: &str) {
        info!(target: "study", session = session_id, context, "wrong answer");
    }

    fn log_hint(&self, session_id: &str, context: &str) {
        info!(target: "study", session = session_id, context, "hint used");
    }

    fn log_completion(&self, session_id: &str, journey: JourneyId) {
        info!(target: "study", session = session_id, journey = journey.0, "journey complete");
    }
}

/// One call the runtime made on a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Chat { player: PlayerId, line: String },
    Display { display: String, lines: [String; 4] },
    Indicator { indicator: String, lit: bool },
    Teleport { player: PlayerId, destination: String },
    GuideMoved { player: PlayerId, anchor: Option<BlockPos> },
    Miss { session_id: String, context: String },
    Hint { session_id: String, context: String },
    Completion { session_id: String, journey: JourneyId },
}

/// Implements every port by recording the calls. Used by tests, the demo
/// and the playtest shell.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Recorded>>,
    /// Destinations that exist; empty accepts any.
    destinations: Vec<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destinations<S: AsRef<str>>(destinations: &[S]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            destinations: destinations.iter().map(|d| d.as_ref().to_string()).collect(),
        }
    }

    fn record(&self, call: Recorded) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn chat_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Chat { line, .. } => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn teleports(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Recorded::Teleport { destination, .. } => Some(destination),
                _ => None,
            })
            .collect()
    }
}

impl ChatSink for Recorder {
    fn send(&self, player: PlayerId, line: &str) -> Result<(), PortError> {
        self.record(Recorded::Chat {
            player,
            line: line.to_string(),
        });
        Ok(())
    }
}

impl DisplayUpdater for Recorder {
    fn set_display(&self, display: &str, lines: &[String; 4]) -> Result<(), PortError> {
        self.record(Recorded::Display {
            display: display.to_string(),
            lines: lines.clone(),
        });
        Ok(())
    }

    fn set_indicator(&self, indicator: &str, lit: bool) -> Result<(), PortError> {
        self.record(Recorded::Indicator {
            indicator: indicator.to_string(),
            lit,
        });
        Ok(())
    }
}

impl Transport for Recorder {
    fn teleport(&self, player: PlayerId, destination: &str) -> Result<(), PortError> {
        if !self.destinations.is_empty() && !self.destinations.iter().any(|d| d == destination) {
            return Err(PortError::UnknownDestination(destination.to_string()));
        }
        self.record(Recorded::Teleport {
            player,
            destination: destination.to_string(),
        });
        Ok(())
    }

    fn move_guide(&self, player: PlayerId, anchor: Option<BlockPos>) -> Result<(), PortError> {
        self.record(Recorded::GuideMoved { player, anchor });
        Ok(())
    }
}

impl EventLogger for Recorder {
    fn log_miss(&self, session_id: &str, context: &str) {
        self.record(Recorded::Miss {
            session_id: session_id.to_string(),
            context: context.to_string(),
        });
    }

    fn log_hint(&self, session_id: &str, context: &str) {
        self.record(Recorded::Hint {
            session_id: session_id.to_string(),
            context: context.to_string(),
        });
    }

    fn log_completion(&self, session_id: &str, journey: JourneyId) {
        self.record(Recorded::Completion {
            session_id: session_id.to_string(),
            journey,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_call_order() {
        let recorder = Recorder::new();
        recorder.send(PlayerId(1), "hello").unwrap();
        recorder.teleport(PlayerId(1), "ramRoom").unwrap();
        recorder.log_miss("abcd", "cow_room");
        assert_eq!(recorder.chat_lines(), vec!["hello"]);
        assert_eq!(recorder.teleports(), vec!["ramRoom"]);
        assert_eq!(recorder.take().len(), 3);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn unknown_destination_is_an_error() {
        let recorder = Recorder::with_destinations(&["ramRoom"]);
        assert!(recorder.teleport(PlayerId(1), "moon").is_err());
        assert!(recorder.teleports().is_empty());
    }
}
