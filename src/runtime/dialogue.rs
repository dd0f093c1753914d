/// Staggered delivery of guide lines.
///
/// Lines go into a per-player queue drained by a spawned task that sleeps
/// `delay` after each line. Interrupting aborts the task, so lines still
/// waiting are dropped and the next room's dialogue starts immediately.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ports::ChatSink;
use crate::schema::player::PlayerId;

pub struct DialoguePlayer {
    sink: Arc<dyn ChatSink>,
    player: PlayerId,
    prefix: String,
    delay: Duration,
    playback: Option<Playback>,
}

struct Playback {
    queue: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl DialoguePlayer {
    pub fn new(sink: Arc<dyn ChatSink>, player: PlayerId, prefix: &str, delay: Duration) -> Self {
        Self {
            sink,
            player,
            prefix: prefix.to_string(),
            delay,
            playback: None,
        }
    }

    /// Queue `lines` behind anything still playing. Must be called from
    /// within a tokio runtime.
    pub fn play(&mut self, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        let playback = match self.playback.take() {
            Some(p) if !p.task.is_finished() => p,
            _ => self.spawn(),
        };
        for line in lines {
            if playback.queue.send(format!("{}{}", self.prefix, line)).is_err() {
                warn!(player = self.player.0, "dialogue task gone; line dropped");
            }
        }
        self.playback = Some(playback);
    }

    /// Drop everything not yet delivered.
    pub fn interrupt(&mut self) {
        if let Some(playback) = self.playback.take() {
            if !playback.task.is_finished() {
                debug!(player = self.player.0, "interrupting dialogue");
            }
            playback.task.abort();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| !p.task.is_finished())
    }

    fn spawn(&self) -> Playback {
        let (queue, mut rx) = mpsc::unbounded_channel::<String>();
        let sink = Arc::clone(&self.sink);
        let player = self.player;
        let delay = self.delay;
        let task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(err) = sink.send(player, &line) {
                    warn!(player = player.0, %err, "dialogue line not delivered");
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        });
        Playback { queue, task }
    }
}

impl Drop for DialoguePlayer {
    fn drop(&mut self) {
        self.interrupt();
    }
}
