/// Per-player actors.
///
/// Each connected player gets a task that owns their `PlayerSession` and
/// drains one queue of triggers, so a player's events are handled strictly
/// in order without locks. Timers scheduled by the engine feed back into
/// the same queue.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::executor::{Executor, Ports};
use crate::core::engine::{PlayerSession, ProgressionEngine, SessionSummary};
use crate::core::progress::StoreError;
use crate::schema::event::Trigger;
use crate::schema::player::PlayerId;

const QUEUE_SIZE: usize = 64;

enum Envelope {
    Trigger(Trigger),
    /// A chat line; the reply says whether the engine swallowed it.
    Chat(String, oneshot::Sender<bool>),
    Close(oneshot::Sender<SessionSummary>),
}

struct ActorHandle {
    queue: mpsc::Sender<Envelope>,
    task: JoinHandle<()>,
}

pub struct Director {
    engine: Arc<ProgressionEngine>,
    executor: Arc<Executor>,
    actors: Mutex<HashMap<PlayerId, ActorHandle>>,
}

impl Director {
    pub fn new(engine: Arc<ProgressionEngine>, ports: Ports) -> Self {
        let executor = Executor::new(ports, engine.config().clone());
        Self {
            engine,
            executor: Arc::new(executor),
            actors: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// Load the player's completions and start their actor. Reconnecting
    /// replaces the previous actor.
    pub async fn connect(&self, player: PlayerId) -> Result<(), StoreError> {
        let completed = self.executor.ports().store.load_completed(player)?;
        let session = self.engine.open_session(player, completed);
        info!(player = player.0, session = %session.session_id, "player connected");

        let (queue, rx) = mpsc::channel(QUEUE_SIZE);
        let task = tokio::spawn(run_actor(
            Arc::clone(&self.engine),
            Arc::clone(&self.executor),
            session,
            queue.downgrade(),
            rx,
        ));
        if queue.send(Envelope::Trigger(Trigger::Joined)).await.is_err() {
            debug!(player = player.0, "actor closed before join; trigger dropped");
        }

        let previous = self
            .actors
            .lock()
            .await
            .insert(player, ActorHandle { queue, task });
        if let Some(old) = previous {
            warn!(player = player.0, "player reconnected; dropping old session");
            old.task.abort();
        }
        Ok(())
    }

    pub async fn is_connected(&self, player: PlayerId) -> bool {
        self.actors.lock().await.contains_key(&player)
    }

    /// Fire-and-forget.
    pub async fn dispatch(&self, player: PlayerId, trigger: Trigger) {
        let Some(queue) = self.queue(player).await else {
            debug!(player = player.0, ?trigger, "trigger for unknown player dropped");
            return;
        };
        if queue.send(Envelope::Trigger(trigger)).await.is_err() {
            warn!(player = player.0, "actor gone; trigger dropped");
        }
    }

    /// Returns true when the line was taken as a reply and must not be
    /// broadcast.
    pub async fn chat(&self, player: PlayerId, text: &str) -> bool {
        let Some(queue) = self.queue(player).await else {
            return false;
        };
        let (reply, answer) = oneshot::channel();
        if queue.send(Envelope::Chat(text.to_string(), reply)).await.is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }

    /// Stop the player's actor and return what they did this session.
    pub async fn disconnect(&self, player: PlayerId) -> Option<SessionSummary> {
        let handle = self.actors.lock().await.remove(&player)?;
        let (reply, summary) = oneshot::channel();
        if handle.queue.send(Envelope::Close(reply)).await.is_err() {
            handle.task.abort();
            return None;
        }
        let summary = summary.await.ok();
        if let Some(s) = &summary {
            info!(
                player = player.0,
                session = %s.session_id,
                hints = s.hints_used,
                wrong = s.wrong_answers,
                "player disconnected"
            );
        }
        summary
    }

    async fn queue(&self, player: PlayerId) -> Option<mpsc::Sender<Envelope>> {
        self.actors.lock().await.get(&player).map(|h| h.queue.clone())
    }
}

async fn run_actor(
    engine: Arc<ProgressionEngine>,
    executor: Arc<Executor>,
    mut session: PlayerSession,
    own_queue: mpsc::WeakSender<Envelope>,
    mut rx: mpsc::Receiver<Envelope>,
) {
    let player = session.player;
    let mut dialogue = executor.dialogue_player(player);

    while let Some(envelope) = rx.recv().await {
        let (reaction, reply) = match envelope {
            Envelope::Trigger(trigger) => (engine.handle(&mut session, &trigger), None),
            Envelope::Chat(text, reply) => {
                let reaction = engine.on_chat_line(&mut session, &text);
                (reaction, Some(reply))
            }
            Envelope::Close(reply) => {
                dialogue.interrupt();
                if reply.send(session.summary()).is_err() {
                    debug!(player = player.0, "disconnect caller gone; summary dropped");
                }
                break;
            }
        };

        let consumed = reaction.consumed;
        for effect in reaction.effects {
            let scheduled = executor.apply(player, &session.session_id, effect, &mut dialogue);
            if let Some((delay, trigger)) = scheduled {
                schedule(own_queue.clone(), delay, trigger);
            }
        }
        if let Some(reply) = reply {
            if reply.send(consumed).is_err() {
                debug!(player = player.0, "chat caller gone; reply dropped");
            }
        }
    }
    debug!(player = player.0, "actor stopped");
}

/// Re-enqueue `trigger` after `delay`, unless the actor is gone by then.
fn schedule(queue: mpsc::WeakSender<Envelope>, delay: std::time::Duration, trigger: Trigger) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match queue.upgrade() {
            Some(queue) => {
                if queue.send(Envelope::Trigger(trigger)).await.is_err() {
                    debug!("scheduled trigger dropped; actor closed");
                }
            }
            None => debug!("scheduled trigger dropped; player gone"),
        }
    });
}
