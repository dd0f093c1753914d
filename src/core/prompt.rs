/// Short-lived prompts that capture the player's next chat line.
///
/// A player has at most one pending prompt. Confirmations gate a checkpoint
/// choice behind "1"/"2"; quizzes gate a phase change behind a correct
/// answer. Unrecognised replies re-issue the same prompt and keep it
/// pending.

use tracing::{debug, warn};

use super::checkpoint::{self, Checkpoint, Choice};
use super::engine::Turn;
use crate::schema::event::Channel;

pub const CONFIRM_QUESTION: &str = "general.confirm_choice";
pub const CANCELLED: &str = "Choice cancelled. Press the button again when ready.";
pub const STALE_CHOICE: &str = "That choice no longer applies here. Press a button again if you still want it.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Confirmation(PendingConfirmation),
    Quiz(PendingQuiz),
    /// The guide's three-item help menu.
    GuideMenu,
    /// A numbered concept list; holds indices into the concept table.
    ConceptChoice(Vec<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Confirmation,
    Quiz,
    GuideMenu,
    ConceptChoice,
}

impl Pending {
    pub fn kind(&self) -> PendingKind {
        match self {
            Pending::Confirmation(_) => PendingKind::Confirmation,
            Pending::Quiz(_) => PendingKind::Quiz,
            Pending::GuideMenu => PendingKind::GuideMenu,
            Pending::ConceptChoice(_) => PendingKind::ConceptChoice,
        }
    }

    /// Confirmations and quizzes gate progress; menus don't.
    pub fn blocks_progress(&self) -> bool {
        matches!(self, Pending::Confirmation(_) | Pending::Quiz(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub checkpoint: Checkpoint,
    pub button: String,
    pub choice: Choice,
    /// Phase the button was pressed in.
    pub raised_in: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuiz {
    pub question: String,
    pub success_phase: String,
    pub success_dialogue: Option<String>,
}

pub(crate) fn pose_confirmation(turn: &mut Turn<'_>, confirmation: PendingConfirmation) {
    let engine = turn.engine;
    let Some(question) = engine.questions.get(CONFIRM_QUESTION) else {
        warn!(question = CONFIRM_QUESTION, "missing question; choice dropped");
        turn.session.pending = None;
        return;
    };
    for line in question.prompt_lines(turn.vars()) {
        turn.say(Channel::Quiz, line);
    }
    turn.session.pending = Some(Pending::Confirmation(confirmation));
}

pub(crate) fn on_confirmation_reply(turn: &mut Turn<'_>, reply: &str) {
    match reply.trim() {
        "1" => {
            let Some(Pending::Confirmation(confirmation)) = turn.session.pending.take() else {
                return;
            };
            if confirmation.raised_in != turn.phase() {
                warn!(
                    player = turn.session.player.0,
                    raised_in = %confirmation.raised_in,
                    phase = %turn.phase(),
                    "discarding stale confirmation"
                );
                turn.notice(STALE_CHOICE);
                return;
            }
            checkpoint::resolve(turn, confirmation.checkpoint, confirmation.choice);
        }
        "2" => {
            turn.session.pending = None;
            turn.notice(CANCELLED);
        }
        _ => {
            let engine = turn.engine;
            match engine.questions.get(CONFIRM_QUESTION) {
                Some(question) => {
                    let wrong = question.wrong.render(turn.vars());
                    turn.say(Channel::Quiz, wrong);
                    for line in question.prompt_lines(turn.vars()) {
                        turn.say(Channel::Quiz, line);
                    }
                }
                None => {
                    warn!(question = CONFIRM_QUESTION, "missing question; clearing confirmation");
                    turn.session.pending = None;
                }
            }
        }
    }
}

/// Ask the question at `path`. A correct answer moves to `success_phase`
/// and speaks `success_dialogue`. A missing question leaves the phase
/// where it is and clears any pending prompt.
pub(crate) fn pose_quiz(
    turn: &mut Turn<'_>,
    path: &str,
    success_phase: &str,
    success_dialogue: Option<&str>,
) {
    let engine = turn.engine;
    let Some(question) = engine.questions.get(path) else {
        warn!(question = path, "missing question; quiz not posed");
        turn.session.pending = None;
        return;
    };
    if let Some(previous) = &turn.session.pending {
        debug!(replaced = ?previous.kind(), question = path, "new quiz replaces pending prompt");
    }
    for line in question.prompt_lines(turn.vars()) {
        turn.say(Channel::Quiz, line);
    }
    turn.session.pending = Some(Pending::Quiz(PendingQuiz {
        question: path.to_string(),
        success_phase: success_phase.to_string(),
        success_dialogue: success_dialogue.map(str::to_string),
    }));
}

pub(crate) fn on_quiz_reply(turn: &mut Turn<'_>, answer: &str) {
    let Some(Pending::Quiz(quiz)) = turn.session.pending.clone() else {
        return;
    };
    let engine = turn.engine;
    let Some(question) = engine.questions.get(&quiz.question) else {
        warn!(question = %quiz.question, "missing question; clearing quiz");
        turn.session.pending = None;
        return;
    };

    if question.check_answer(answer, turn.vars()) {
        turn.session.pending = None;
        commit(turn, &quiz.success_phase, quiz.success_dialogue.as_deref());
    } else {
        let context = turn.phase().to_string();
        turn.log_miss(&context);
        let wrong = question.wrong.render(turn.vars());
        turn.say(Channel::Quiz, wrong);
        for line in question.prompt_lines(turn.vars()) {
            turn.say(Channel::Quiz, line);
        }
    }
}

/// Show the pending confirmation or quiz again.
pub(crate) fn reissue(turn: &mut Turn<'_>) {
    let path = match &turn.session.pending {
        Some(Pending::Confirmation(_)) => CONFIRM_QUESTION.to_string(),
        Some(Pending::Quiz(quiz)) => quiz.question.clone(),
        _ => return,
    };
    let engine = turn.engine;
    if let Some(question) = engine.questions.get(&path) {
        for line in question.prompt_lines(turn.vars()) {
            turn.say(Channel::Quiz, line);
        }
    }
}

fn commit(turn: &mut Turn<'_>, phase: &str, dialogue: Option<&str>) {
    turn.set_phase(phase);
    if let Some(path) = dialogue {
        turn.speak(path);
    }
}
