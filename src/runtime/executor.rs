/// Carries out engine effects against the ports.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::dialogue::DialoguePlayer;
use super::ports::{ChatSink, DisplayUpdater, EventLogger, Recorder, Transport};
use crate::config::EngineConfig;
use crate::core::progress::ProgressStore;
use crate::schema::event::{Effect, Trigger};
use crate::schema::player::PlayerId;

/// The collaborators an executor talks to.
#[derive(Clone)]
pub struct Ports {
    pub chat: Arc<dyn ChatSink>,
    pub displays: Arc<dyn DisplayUpdater>,
    pub transport: Arc<dyn Transport>,
    pub events: Arc<dyn EventLogger>,
    pub store: Arc<dyn ProgressStore>,
}

impl Ports {
    /// Every surface goes to `recorder`; completions go to `store`.
    pub fn recording(recorder: Arc<Recorder>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            chat: recorder.clone(),
            displays: recorder.clone(),
            transport: recorder.clone(),
            events: recorder,
            store,
        }
    }
}

pub struct Executor {
    ports: Ports,
    config: EngineConfig,
}

impl Executor {
    pub fn new(ports: Ports, config: EngineConfig) -> Self {
        Self { ports, config }
    }

    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// A dialogue player bound to this executor's chat sink.
    pub fn dialogue_player(&self, player: PlayerId) -> DialoguePlayer {
        DialoguePlayer::new(
            self.ports.chat.clone(),
            player,
            &self.config.guide_prefix,
            self.config.line_delay(),
        )
    }

    /// Apply one effect. `Schedule` is handed back because only the caller
    /// can feed a trigger into its own queue.
    pub fn apply(
        &self,
        player: PlayerId,
        session_id: &str,
        effect: Effect,
        dialogue: &mut DialoguePlayer,
    ) -> Option<(Duration, Trigger)> {
        match effect {
            Effect::Dialogue { lines, .. } => dialogue.play(&lines),
            Effect::Message { channel, text } => {
                let line = format!("{}{}", self.config.prefix(channel), text);
                if let Err(err) = self.ports.chat.send(player, &line) {
                    warn!(player = player.0, %err, "chat line not delivered");
                }
            }
            Effect::InterruptDialogue => dialogue.interrupt(),
            Effect::SetDisplay { display: name, lines } => {
                if let Err(err) = self.ports.displays.set_display(&name, &lines) {
                    warn!(display = %name, %err, "display not updated");
                }
            }
            Effect::SetIndicator { indicator, lit } => {
                if let Err(err) = self.ports.displays.set_indicator(&indicator, lit) {
                    warn!(indicator = %indicator, %err, "indicator not updated");
                }
            }
            Effect::Teleport { destination } => {
                if let Err(err) = self.ports.transport.teleport(player, &destination) {
                    warn!(player = player.0, destination = %destination, %err, "teleport failed");
                }
            }
            Effect::MoveGuide { anchor } => {
                if let Err(err) = self.ports.transport.move_guide(player, anchor) {
                    warn!(player = player.0, %err, "guide not moved");
                }
            }
            Effect::MarkComplete { journey } => {
                if let Err(err) = self.ports.store.mark_complete(player, journey) {
                    warn!(player = player.0, journey = journey.0, %err, "completion not stored");
                }
                self.ports.events.log_completion(session_id, journey);
            }
            Effect::LogMiss { context } => self.ports.events.log_miss(session_id, &context),
            Effect::LogHint { context } => self.ports.events.log_hint(session_id, &context),
            Effect::Schedule { delay, trigger } => return Some((delay, trigger)),
        }
        None
    }
}
