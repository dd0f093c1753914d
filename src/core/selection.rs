/// Journey selection at the Adventurer Mode terminal.

use rand::seq::SliceRandom;
use tracing::{debug, info};

use super::engine::Turn;
use super::phase;
use crate::schema::event::Channel;
use crate::schema::journey::Journey;

pub const RANDOM_CHOICE: u32 = 8;
pub const NOT_A_NUMBER: &str = "Please type a number between 1 and 8.";
pub const OUT_OF_RANGE: &str = "Invalid choice. Type 1-7 to select a journey or 8 for random.";

/// The numbered list with completion marks.
pub(crate) fn show_journey_list(turn: &mut Turn<'_>) {
    let engine = turn.engine;
    turn.say(Channel::Guide, "Choose Your Journey");
    turn.say(Channel::Guide, "Complete them in order to unlock the next.");
    for journey in engine.catalog.iter() {
        let mark = if turn.session.progress.is_complete(journey.id) {
            "[✓]"
        } else if turn.session.progress.is_unlocked(journey.id) {
            "[→]"
        } else {
            "[🔒]"
        };
        let line = format!("  {}. {} {}", journey.id.0, mark, journey.display_name);
        turn.say(Channel::Guide, line);
    }
    turn.say(
        Channel::Guide,
        "Type 1-7 to choose, or 8 for random (unlocked only).",
    );
}

pub(crate) fn on_reply(turn: &mut Turn<'_>, reply: &str) {
    let Ok(choice) = reply.trim().parse::<u32>() else {
        turn.notice(NOT_A_NUMBER);
        return;
    };
    let engine = turn.engine;

    let (journey, path): (&Journey, &str) = if choice == RANDOM_CHOICE {
        let unlocked = turn.session.progress.unlocked(&engine.catalog);
        let Some(journey) = unlocked.choose(&mut turn.session.rng).copied() else {
            debug!("no unlocked journeys to pick from");
            return;
        };
        (journey, "rooms.terminal.journey_random")
    } else {
        let Some(journey) = engine.catalog.by_number(choice) else {
            turn.notice(OUT_OF_RANGE);
            return;
        };
        if !turn.session.progress.is_unlocked(journey.id) {
            let previous = journey
                .id
                .previous()
                .and_then(|id| engine.catalog.get(id))
                .map_or("the previous journey", |j| j.display_name);
            turn.notice(format!(
                "🔒 Journey {} is locked. Complete \"{}\" first.",
                choice, previous
            ));
            return;
        }
        (journey, "rooms.terminal.journey_selected")
    };

    info!(
        player = turn.session.player.0,
        session = %turn.session.session_id,
        journey = journey.id.0,
        "journey selected"
    );
    turn.session.pending = None;
    turn.session.state.assign_journey(journey, &engine.layout);
    turn.speak(path);
    turn.set_phase(phase::TERMINAL_JOURNEY_CHOSEN);
}
