/// Inputs to the engine and the effects it asks the front end to perform.

use std::time::Duration;

use super::journey::JourneyId;
use super::region::BlockPos;

/// Something a player did, or a timer the engine scheduled earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Player connected.
    Joined,
    /// Player stands at a new block; the engine works out the region.
    Moved(BlockPos),
    /// The containing region changed. `None` means "outside every room".
    RegionEntered(Option<String>),
    ButtonPressed(String),
    ChatLine(String),
    /// Player asked the guide for help.
    GuideRequested,
    /// Text submitted to the calculator.
    CalculatorInput(String),
    /// The calculator finished "working" on an earlier input.
    CalculationReady(String),
}

/// Who a chat line appears to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Guide,
    Quiz,
    Calculator,
    Clock,
    System,
}

/// A side effect produced by a transition. The engine only decides these;
/// the runtime carries them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Guide lines delivered one after another with a delay between them.
    Dialogue { path: String, lines: Vec<String> },
    /// A single line, delivered at once.
    Message { channel: Channel, text: String },
    /// Drop any guide lines still waiting to be delivered.
    InterruptDialogue,
    SetDisplay { display: String, lines: [String; 4] },
    SetIndicator { indicator: String, lit: bool },
    Teleport { destination: String },
    /// Put the guide at a region's anchor, or next to the player.
    MoveGuide { anchor: Option<BlockPos> },
    MarkComplete { journey: JourneyId },
    LogMiss { context: String },
    LogHint { context: String },
    /// Feed `trigger` back into the same player's queue after `delay`.
    Schedule { delay: Duration, trigger: Trigger },
}

impl Effect {
    pub fn dialogue_path(&self) -> Option<&str> {
        match self {
            Effect::Dialogue { path, .. } => Some(path),
            _ => None,
        }
    }
}
