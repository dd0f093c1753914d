/// The progression engine: turns player triggers into phase changes plus a
/// list of effects for the front end.
///
/// The engine itself is immutable and shared. All per-player state lives in
/// a `PlayerSession`, which the caller owns and passes in for every
/// trigger, so one player's events are naturally processed in order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::clock::ClockPuzzle;
use super::content::{ContentError, DialogueBook, QuestionBank};
use super::phase::{self, PhaseVocabulary};
use super::progress::Progress;
use super::prompt::{self, Pending, PendingKind};
use super::{buttons, calculator, guide, manifest, rooms, selection};
use crate::config::EngineConfig;
use crate::schema::address::AddressLayout;
use crate::schema::event::{Channel, Effect, Trigger};
use crate::schema::journey::{Journey, JourneyCatalog, JourneyId};
use crate::schema::player::{PlayerId, PlayerState, Vars};
use crate::schema::region::{BlockPos, WorldLayout};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("transition tables reference undeclared phase '{0}'")]
    UndeclaredPhase(String),
}

/// Result of handling one trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    pub effects: Vec<Effect>,
    /// Only meaningful for chat lines: the engine took the line as a reply,
    /// so it must not be broadcast.
    pub consumed: bool,
}

impl Reaction {
    /// Dialogue paths spoken, in order.
    pub fn spoken(&self) -> Vec<&str> {
        self.effects.iter().filter_map(Effect::dialogue_path).collect()
    }

    /// Every delivered line, dialogue and single messages alike.
    pub fn lines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for effect in &self.effects {
            match effect {
                Effect::Dialogue { lines, .. } => out.extend(lines.iter().map(String::as_str)),
                Effect::Message { text, .. } => out.push(text.as_str()),
                _ => {}
            }
        }
        out
    }

    pub fn teleports(&self) -> Vec<&str> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Teleport { destination } => Some(destination.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn display(&self, id: &str) -> Option<&[String; 4]> {
        self.effects.iter().rev().find_map(|e| match e {
            Effect::SetDisplay { display, lines } if display == id => Some(lines),
            _ => None,
        })
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub player: PlayerId,
    pub session_id: String,
    pub journey: Option<JourneyId>,
    pub phase: String,
    pub hints_used: u32,
    pub wrong_answers: u32,
    pub completed: Vec<JourneyId>,
}

/// Everything the engine tracks for one connected player.
#[derive(Debug)]
pub struct PlayerSession {
    pub player: PlayerId,
    /// Short anonymous id attached to study events.
    pub session_id: String,
    pub state: PlayerState,
    pub progress: Progress,
    pub(crate) pending: Option<Pending>,
    pub(crate) last_region: Option<String>,
    pub(crate) clock: Option<ClockPuzzle>,
    pub(crate) calculating: bool,
    pub(crate) hints_used: u32,
    pub(crate) wrong_answers: u32,
    pub(crate) rng: StdRng,
}

impl PlayerSession {
    pub fn phase(&self) -> &str {
        &self.state.phase
    }

    pub fn journey(&self) -> Option<JourneyId> {
        self.state.journey
    }

    pub fn var(&self, key: &str) -> &str {
        self.state.var(key)
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    pub fn last_region(&self) -> Option<&str> {
        self.last_region.as_deref()
    }

    pub fn is_calculating(&self) -> bool {
        self.calculating
    }

    pub fn clock(&self) -> Option<&ClockPuzzle> {
        self.clock.as_ref()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            player: self.player,
            session_id: self.session_id.clone(),
            journey: self.state.journey,
            phase: self.state.phase.clone(),
            hints_used: self.hints_used,
            wrong_answers: self.wrong_answers,
            completed: self.progress.completed().into_iter().collect(),
        }
    }
}

/// Working context for handling one trigger: the engine, the player's
/// session, and the effects produced so far.
pub(crate) struct Turn<'a> {
    pub(crate) engine: &'a ProgressionEngine,
    pub(crate) session: &'a mut PlayerSession,
    effects: Vec<Effect>,
}

impl<'a> Turn<'a> {
    fn new(engine: &'a ProgressionEngine, session: &'a mut PlayerSession) -> Self {
        Self {
            engine,
            session,
            effects: Vec::new(),
        }
    }

    pub(crate) fn phase(&self) -> &str {
        &self.session.state.phase
    }

    /// Unknown phases are logged once per trigger and treated as no-ops.
    pub(crate) fn phase_is_declared(&self) -> bool {
        let declared = self.engine.vocabulary.is_declared(self.phase());
        if !declared {
            warn!(
                player = self.session.player.0,
                phase = %self.phase(),
                "player is in an undeclared phase; ignoring trigger"
            );
        }
        declared
    }

    pub(crate) fn journey(&self) -> Option<&'a Journey> {
        let engine: &'a ProgressionEngine = self.engine;
        self.session.state.journey.and_then(|id| engine.catalog.get(id))
    }

    pub(crate) fn vars(&self) -> &Vars {
        &self.session.state.vars
    }

    pub(crate) fn var(&self, key: &str) -> &str {
        self.session.state.var(key)
    }

    pub(crate) fn set_var(&mut self, key: &str, value: impl Into<String>) {
        self.session.state.vars.set(key, value);
    }

    pub(crate) fn set_phase(&mut self, next: &str) {
        if self.session.state.phase != next {
            debug!(
                player = self.session.player.0,
                from = %self.session.state.phase,
                to = next,
                "phase transition"
            );
            self.session.state.phase = next.to_string();
        }
    }

    pub(crate) fn speak(&mut self, path: &str) {
        let lines = self.engine.dialogue.lines(path, &self.session.state.vars);
        self.push_dialogue(path, lines);
    }

    fn push_dialogue(&mut self, path: &str, lines: Option<Vec<String>>) {
        match lines {
            Some(lines) if !lines.is_empty() => self.effects.push(Effect::Dialogue {
                path: path.to_string(),
                lines,
            }),
            Some(_) => {}
            None => warn!(path, "missing dialogue"),
        }
    }

    /// First line at `path`, rendered against the player's vars.
    pub(crate) fn line(&self, path: &str) -> Option<String> {
        self.engine.dialogue.get_line(path, &self.session.state.vars)
    }

    pub(crate) fn say(&mut self, channel: Channel, text: impl Into<String>) {
        self.effects.push(Effect::Message {
            channel,
            text: text.into(),
        });
    }

    pub(crate) fn notice(&mut self, text: impl Into<String>) {
        self.say(Channel::System, text);
    }

    /// Set a four-line sign. `/` separates lines, as in `"Go to COW/room"`.
    pub(crate) fn sign(&mut self, display: &str, text: &str) {
        let mut lines: [String; 4] = Default::default();
        if !text.is_empty() {
            for (slot, part) in lines.iter_mut().zip(text.split('/')) {
                *slot = part.to_string();
            }
        }
        self.effects.push(Effect::SetDisplay {
            display: display.to_string(),
            lines,
        });
    }

    pub(crate) fn display(&mut self, display: &str, lines: [String; 4]) {
        self.effects.push(Effect::SetDisplay {
            display: display.to_string(),
            lines,
        });
    }

    pub(crate) fn indicator(&mut self, indicator: String, lit: bool) {
        self.effects.push(Effect::SetIndicator { indicator, lit });
    }

    pub(crate) fn teleport(&mut self, destination: &str) {
        self.effects.push(Effect::Teleport {
            destination: destination.to_string(),
        });
    }

    pub(crate) fn log_miss(&mut self, context: &str) {
        self.session.wrong_answers += 1;
        self.effects.push(Effect::LogMiss {
            context: context.to_string(),
        });
    }

    pub(crate) fn log_hint(&mut self, context: &str) {
        self.session.hints_used += 1;
        self.effects.push(Effect::LogHint {
            context: context.to_string(),
        });
    }

    pub(crate) fn schedule(&mut self, delay: Duration, trigger: Trigger) {
        self.effects.push(Effect::Schedule { delay, trigger });
    }

    pub(crate) fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Record completion in the session cache; the store write is only
    /// requested the first time.
    pub(crate) fn mark_complete(&mut self, journey: JourneyId) {
        if self.session.progress.mark_complete(journey) {
            self.effects.push(Effect::MarkComplete { journey });
        } else {
            debug!(journey = journey.0, "journey already complete");
        }
    }

    fn into_reaction(self, consumed: bool) -> Reaction {
        Reaction {
            effects: self.effects,
            consumed,
        }
    }
}

/// The top-level engine. Built via `ProgressionEngine::builder()`.
#[derive(Debug)]
pub struct ProgressionEngine {
    pub(crate) catalog: JourneyCatalog,
    pub(crate) dialogue: DialogueBook,
    pub(crate) questions: QuestionBank,
    pub(crate) world: WorldLayout,
    pub(crate) vocabulary: PhaseVocabulary,
    pub(crate) config: EngineConfig,
    pub(crate) layout: AddressLayout,
}

impl ProgressionEngine {
    pub fn builder() -> ProgressionEngineBuilder {
        ProgressionEngineBuilder::default()
    }

    pub fn catalog(&self) -> &JourneyCatalog {
        &self.catalog
    }

    pub fn dialogue(&self) -> &DialogueBook {
        &self.dialogue
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    pub fn world(&self) -> &WorldLayout {
        &self.world
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &PhaseVocabulary {
        &self.vocabulary
    }

    /// Start tracking a player. `completed` comes from the progress store
    /// and seeds the in-memory unlock cache.
    pub fn open_session(
        &self,
        player: PlayerId,
        completed: impl IntoIterator<Item = JourneyId>,
    ) -> PlayerSession {
        let seed = self.config.seed ^ player.0.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = StdRng::seed_from_u64(seed);
        let session_id = format!("{:08x}", rng.gen::<u32>());
        PlayerSession {
            player,
            session_id,
            state: PlayerState::new(phase::TERMINAL_SPAWN),
            progress: Progress::new(completed),
            pending: None,
            last_region: None,
            clock: None,
            calculating: false,
            hints_used: 0,
            wrong_answers: 0,
            rng,
        }
    }

    pub fn handle(&self, session: &mut PlayerSession, trigger: &Trigger) -> Reaction {
        match trigger {
            Trigger::Joined => self.on_join(session),
            Trigger::Moved(pos) => self.on_moved(session, *pos),
            Trigger::RegionEntered(title) => self.on_region_entered(session, title.as_deref()),
            Trigger::ButtonPressed(id) => self.on_button_pressed(session, id),
            Trigger::ChatLine(text) => self.on_chat_line(session, text),
            Trigger::GuideRequested => self.on_guide_requested(session),
            Trigger::CalculatorInput(text) => self.on_calculator_input(session, text),
            Trigger::CalculationReady(text) => self.on_calculation_ready(session, text),
        }
    }

    pub fn on_join(&self, session: &mut PlayerSession) -> Reaction {
        session.last_region = None;
        let mut turn = Turn::new(self, session);
        turn.set_phase(phase::TERMINAL_SPAWN);
        turn.speak("rooms.terminal.initial_spawn");
        turn.into_reaction(false)
    }

    /// Resolve a position to a region and forward it as a region change.
    pub fn on_moved(&self, session: &mut PlayerSession, pos: BlockPos) -> Reaction {
        let title = self.world.regions.region_at(pos).map(|r| r.title.clone());
        self.on_region_entered(session, title.as_deref())
    }

    /// Repeated notifications for the region the player is already in are
    /// ignored.
    pub fn on_region_entered(&self, session: &mut PlayerSession, title: Option<&str>) -> Reaction {
        if session.last_region.as_deref() == title {
            return Reaction::default();
        }
        session.last_region = title.map(str::to_string);

        let mut turn = Turn::new(self, session);
        if let Some(title) = title {
            rooms::enter(&mut turn, title);
        }
        turn.into_reaction(false)
    }

    pub fn on_button_pressed(&self, session: &mut PlayerSession, button: &str) -> Reaction {
        let mut turn = Turn::new(self, session);
        buttons::press(&mut turn, button);
        turn.into_reaction(false)
    }

    /// Route a chat line to whatever is waiting for it. Lines nobody is
    /// waiting for pass through unconsumed.
    pub fn on_chat_line(&self, session: &mut PlayerSession, text: &str) -> Reaction {
        let kind = session.pending.as_ref().map(Pending::kind);
        let mut turn = Turn::new(self, session);
        let consumed = match kind {
            Some(PendingKind::Confirmation) => {
                prompt::on_confirmation_reply(&mut turn, text);
                true
            }
            Some(PendingKind::Quiz) => {
                prompt::on_quiz_reply(&mut turn, text);
                true
            }
            Some(PendingKind::GuideMenu) => {
                guide::on_menu_reply(&mut turn, text);
                true
            }
            Some(PendingKind::ConceptChoice) => {
                guide::on_concept_reply(&mut turn, text);
                true
            }
            None if turn.phase() == phase::ADVENTURER_SELECT => {
                selection::on_reply(&mut turn, text);
                true
            }
            None => false,
        };
        turn.into_reaction(consumed)
    }

    pub fn on_confirmation_reply(&self, session: &mut PlayerSession, reply: &str) -> Reaction {
        if !matches!(session.pending, Some(Pending::Confirmation(_))) {
            return Reaction::default();
        }
        self.on_chat_line(session, reply)
    }

    pub fn on_quiz_reply(&self, session: &mut PlayerSession, answer: &str) -> Reaction {
        if !matches!(session.pending, Some(Pending::Quiz(_))) {
            return Reaction::default();
        }
        self.on_chat_line(session, answer)
    }

    pub fn on_guide_requested(&self, session: &mut PlayerSession) -> Reaction {
        let mut turn = Turn::new(self, session);
        guide::request(&mut turn);
        turn.into_reaction(false)
    }

    pub fn on_calculator_input(&self, session: &mut PlayerSession, input: &str) -> Reaction {
        let mut turn = Turn::new(self, session);
        calculator::on_input(&mut turn, input);
        turn.into_reaction(false)
    }

    pub fn on_calculation_ready(&self, session: &mut PlayerSession, input: &str) -> Reaction {
        let mut turn = Turn::new(self, session);
        calculator::on_ready(&mut turn, input);
        turn.into_reaction(false)
    }
}

/// Builder for `ProgressionEngine`.
#[derive(Default)]
pub struct ProgressionEngineBuilder {
    content_dir: Option<PathBuf>,
    config: Option<EngineConfig>,
    seed: Option<u64>,
    catalog: Option<JourneyCatalog>,
    dialogue: Option<DialogueBook>,
    questions: Option<QuestionBank>,
    world: Option<WorldLayout>,
    extra_phases: Vec<String>,
}

impl ProgressionEngineBuilder {
    /// Load `config.ron`, `dialogue.ron`, `questions.ron` and `world.ron`
    /// from `path`. Missing files are skipped.
    pub fn content_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.content_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_catalog(mut self, catalog: JourneyCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Provide dialogue directly. Paths here override the content dir.
    pub fn with_dialogue(mut self, dialogue: DialogueBook) -> Self {
        self.dialogue = Some(dialogue);
        self
    }

    /// Provide questions directly. Paths here override the content dir.
    pub fn with_questions(mut self, questions: QuestionBank) -> Self {
        self.questions = Some(questions);
        self
    }

    pub fn with_world(mut self, world: WorldLayout) -> Self {
        self.world = Some(world);
        self
    }

    /// Accept an extra phase tag, for content that introduces its own.
    pub fn declare_phase(mut self, phase: &str) -> Self {
        self.extra_phases.push(phase.to_string());
        self
    }

    pub fn build(self) -> Result<ProgressionEngine, EngineError> {
        let mut config = self.config;
        let mut dialogue = DialogueBook::default();
        let mut questions = QuestionBank::default();
        let mut world = self.world;

        if let Some(dir) = &self.content_dir {
            let config_path = dir.join("config.ron");
            if config.is_none() && config_path.exists() {
                config = Some(EngineConfig::load_from_ron(&config_path)?);
            }
            let dialogue_path = dir.join("dialogue.ron");
            if dialogue_path.exists() {
                dialogue.merge(DialogueBook::load_from_ron(&dialogue_path)?);
            }
            let questions_path = dir.join("questions.ron");
            if questions_path.exists() {
                questions.merge(QuestionBank::load_from_ron(&questions_path)?);
            }
            let world_path = dir.join("world.ron");
            if world.is_none() && world_path.exists() {
                world = Some(WorldLayout::load_from_ron(&world_path)?);
            }
        }

        if let Some(provided) = self.dialogue {
            dialogue.merge(provided);
        }
        if let Some(provided) = self.questions {
            questions.merge(provided);
        }

        let mut config = config.unwrap_or_default();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        let mut vocabulary = PhaseVocabulary::default();
        for extra in &self.extra_phases {
            vocabulary.declare(extra);
        }
        if let Some(undeclared) = vocabulary.first_undeclared(manifest::referenced_phases()) {
            return Err(EngineError::UndeclaredPhase(undeclared.to_string()));
        }

        let layout = config.layout();
        Ok(ProgressionEngine {
            catalog: self.catalog.unwrap_or_else(JourneyCatalog::standard),
            dialogue,
            questions,
            world: world.unwrap_or_default(),
            vocabulary,
            config,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ProgressionEngine {
        let mut dialogue = DialogueBook::default();
        dialogue.insert("rooms.terminal.initial_spawn", &["Welcome, {journey}."]);
        dialogue.insert("rooms.tlb_room.at_spawn", &["The TLB caches translations."]);
        ProgressionEngine::builder()
            .with_dialogue(dialogue)
            .seed(42)
            .build()
            .unwrap()
    }

    #[test]
    fn builds_with_defaults() {
        let engine = ProgressionEngine::builder().build().unwrap();
        assert_eq!(engine.catalog().len(), 7);
        assert!(engine.dialogue().is_empty());
        assert_eq!(engine.config().page_offset_bits, 4);
    }

    #[test]
    fn sessions_start_at_terminal_spawn() {
        let engine = engine();
        let session = engine.open_session(PlayerId(1), [JourneyId(1)]);
        assert_eq!(session.phase(), phase::TERMINAL_SPAWN);
        assert!(session.progress.is_complete(JourneyId(1)));
        assert_eq!(session.session_id.len(), 8);
        assert!(session.pending().is_none());
    }

    #[test]
    fn session_ids_are_seeded() {
        let engine = engine();
        let a = engine.open_session(PlayerId(1), []);
        let b = engine.open_session(PlayerId(1), []);
        let c = engine.open_session(PlayerId(2), []);
        assert_eq!(a.session_id, b.session_id);
        assert_ne!(a.session_id, c.session_id);
    }

    #[test]
    fn join_speaks_with_unknown_placeholders_verbatim() {
        let engine = engine();
        let mut session = engine.open_session(PlayerId(1), []);
        let reaction = engine.on_join(&mut session);
        assert_eq!(reaction.lines(), vec!["Welcome, {journey}."]);
    }

    #[test]
    fn duplicate_region_notifications_are_ignored() {
        let engine = engine();
        let mut session = engine.open_session(PlayerId(1), []);
        let first = engine.on_region_entered(&mut session, Some("Learner Mode"));
        assert!(!first.effects.is_empty());
        let again = engine.on_region_entered(&mut session, Some("Learner Mode"));
        assert!(again.effects.is_empty());

        let left = engine.on_region_entered(&mut session, None);
        assert!(left.effects.is_empty());
        assert_eq!(session.last_region(), None);
    }

    #[test]
    fn unclaimed_chat_passes_through() {
        let engine = engine();
        let mut session = engine.open_session(PlayerId(1), []);
        let reaction = engine.on_chat_line(&mut session, "hello everyone");
        assert!(!reaction.consumed);
        assert!(reaction.effects.is_empty());
    }

    #[test]
    fn sign_splits_on_slashes() {
        let engine = engine();
        let mut session = engine.open_session(PlayerId(1), []);
        let mut turn = Turn::new(&engine, &mut session);
        turn.sign("perChamber.sign6", "Go to COW/room");
        let reaction = turn.into_reaction(false);
        assert_eq!(
            reaction.display("perChamber.sign6").unwrap(),
            &["Go to COW".to_string(), "room".to_string(), String::new(), String::new()]
        );
    }

    #[test]
    fn undeclared_phase_is_a_no_op() {
        let engine = engine();
        let mut session = engine.open_session(PlayerId(1), []);
        session.state.phase = "museum_tour".to_string();
        let reaction = engine.on_button_pressed(&mut session, "ramMix");
        assert!(reaction.effects.is_empty());
        assert_eq!(session.phase(), "museum_tour");

        let reaction = engine.on_region_entered(&mut session, Some("TLB Room"));
        assert!(reaction.effects.is_empty());
        assert_eq!(session.phase(), "museum_tour");
    }
}
