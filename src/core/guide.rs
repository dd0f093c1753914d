/// The guide's help menu: replay the room's explanation, get a hint for
/// the current phase, or ask about a concept.

use tracing::debug;

use super::engine::Turn;
use super::phase;
use super::prompt::{self, Pending};
use crate::schema::event::Channel;

pub const MENU: [&str; 4] = [
    "What would you like to know?",
    "1. Explain again - Replay instructions",
    "2. I'm lost - Get a hint",
    "3. Explain a concept - Learn terminology",
];
pub const MENU_RETRY: &str = "Please type 1, 2, or 3.";
pub const BUSY: &str = "Answer the question in front of you first.";
pub const NOTHING_TO_ADD: &str = "I have nothing more to add right now.";
pub const HINT_FALLBACK: &str = "Look around carefully. The answer is nearby.";
pub const NO_CONCEPTS: &str = "There are no concepts to explain in this area.";
pub const NO_EXPLANATION: &str = "I don't have an explanation for that yet.";

/// Display name and `explanations.*` key.
pub const CONCEPTS: [(&str, &str); 14] = [
    ("TLB Hit", "tlb.hit"),
    ("TLB Miss", "tlb.miss"),
    ("TLB Location", "tlb.location"),
    ("Virtual Page Number (VPN)", "address.vpn"),
    ("Page Offset", "address.offset"),
    ("Why Multi-Level Page Tables?", "page_table.why_multi_level"),
    ("Page Table Entry (PTE)", "page_table.pte"),
    ("Page Fault", "permission_chamber.page_fault"),
    ("Segmentation Fault", "permission_chamber.segfault"),
    ("Copy-on-Write (COW)", "memory.cow_what"),
    ("Lazy Loading", "memory.lazy_loading_what"),
    ("Swap Space", "memory.swap_what"),
    ("RAM", "memory.ram_what"),
    ("CLOCK Algorithm", "memory.clock_algo"),
];

/// Indices into `CONCEPTS` worth offering in the `current` phase.
pub fn concepts_for_phase(current: &str) -> &'static [usize] {
    match current {
        phase::TLB_SPAWN | phase::TLB_AFTER_CALCULATOR => &[0, 1, 2, 3, 4],
        phase::CALCULATOR_FROM_TLB => &[3, 4],
        phase::PAGE_DIRECTORY => &[3, 4, 5, 6],
        phase::PERMISSION_DECISION | phase::PAGE_FAULT_TYPE => &[6, 7, 8],
        phase::PAGE_FAULT_CORRIDOR => &[7, 9, 10, 11],
        phase::LAZY_ALLOC_DECISION | phase::LAZY_ALLOC_COW => &[7, 9],
        phase::COW_DECISION => &[9],
        phase::LAZY_LOADING_ENTERED => &[10],
        phase::DISK_LAZY_LOADING | phase::DISK_SWAP_RETRIEVAL => &[10, 11],
        p if p.starts_with("ram_") => &[9, 10, 12],
        p if p.starts_with("swap_") => &[11, 13],
        _ => &[],
    }
}

/// The room explanation to replay in the `current` phase.
pub fn replay_path(current: &str) -> Option<&'static str> {
    let path = match current {
        phase::TERMINAL_SPAWN => "rooms.terminal.initial_spawn",
        phase::TLB_SPAWN => "rooms.tlb_room.at_spawn",
        phase::TLB_AFTER_CALCULATOR => "rooms.tlb_room.after_calculator",
        phase::CALCULATOR_FROM_TLB => "rooms.calculator_room.from_tlb_spawn",
        phase::CALCULATOR_FROM_LAZY_LOADING => "rooms.calculator_room.from_lazy_loading_spawn",
        phase::PAGE_DIRECTORY => "rooms.page_table_library.page_directory",
        phase::PERMISSION_DECISION => "rooms.permission_chamber.at_spawn",
        phase::PAGE_FAULT_TYPE => "rooms.permission_chamber.page_fault_subtype_prompt",
        phase::PAGE_FAULT_CORRIDOR => "rooms.page_fault_corridor.at_enter",
        phase::LAZY_ALLOC_DECISION => "rooms.lazy_allocation_room.at_enter",
        phase::LAZY_ALLOC_COW => "rooms.lazy_allocation_room.second_visit",
        phase::COW_DECISION => "rooms.cow_room.at_spawn",
        phase::LAZY_LOADING_ENTERED => "rooms.lazy_loading_room.at_enter",
        phase::DISK_LAZY_LOADING | phase::DISK_SWAP_RETRIEVAL => "rooms.disk_room.at_spawn",
        p if p.starts_with("ram_") => "rooms.ram_room.at_spawn",
        p if p.starts_with("swap_") => "rooms.swap_district.at_spawn",
        _ => return None,
    };
    Some(path)
}

/// The `hints.*` path for the `current` phase. `direct_hit` picks the TLB hint variant.
pub fn hint_path(current: &str, direct_hit: bool) -> &'static str {
    match current {
        phase::TERMINAL_SPAWN => "hints.terminal.before_entering",
        phase::TLB_SPAWN => "hints.tlb_room.before_calculator",
        phase::TLB_AFTER_CALCULATOR if direct_hit => "hints.tlb_room.after_calculator_lucky",
        phase::TLB_AFTER_CALCULATOR => "hints.tlb_room.after_calculator_non_lucky",
        phase::CALCULATOR_FROM_TLB => "hints.calculator_room.from_tlb_hint1",
        phase::CALCULATOR_FROM_LAZY_LOADING => "hints.calculator_room.from_lazy_loading",
        phase::PAGE_DIRECTORY => "hints.page_table_library.page_directory",
        phase::CORRECT_FLOOR => "hints.page_table_library.correct_floor",
        phase::WRONG_FLOOR => "hints.page_table_library.wrong_floor",
        phase::PERMISSION_DECISION => "hints.permission_chamber.decision",
        phase::PAGE_FAULT_TYPE => "hints.permission_chamber.page_fault_type",
        phase::PAGE_FAULT_CORRIDOR => "hints.page_fault_corridor.lost",
        phase::LAZY_ALLOC_DECISION => "hints.lazy_allocation_room.first_visit",
        phase::LAZY_ALLOC_COW => "hints.lazy_allocation_room.second_visit",
        phase::COW_DECISION => "hints.cow_room.lost",
        phase::LAZY_LOADING_ENTERED => "hints.lazy_loading_room.clues",
        phase::DISK_LAZY_LOADING => "hints.disk_room.lazy_loading",
        phase::DISK_SWAP_RETRIEVAL => "hints.disk_room.swap_out",
        p if p.starts_with("ram_") => "hints.ram_room.general",
        p if p.starts_with("swap_") => "hints.swap_district.lost",
        _ => "hints.terminal.before_entering",
    }
}

pub(crate) fn request(turn: &mut Turn<'_>) {
    if turn.session.pending.as_ref().is_some_and(Pending::blocks_progress) {
        turn.notice(BUSY);
        prompt::reissue(turn);
        return;
    }
    show_menu(turn);
}

fn show_menu(turn: &mut Turn<'_>) {
    for line in MENU {
        turn.say(Channel::Guide, line);
    }
    turn.session.pending = Some(Pending::GuideMenu);
}

pub(crate) fn on_menu_reply(turn: &mut Turn<'_>, reply: &str) {
    match reply.trim() {
        "1" => {
            turn.session.pending = None;
            replay(turn);
        }
        "2" => {
            turn.session.pending = None;
            hint(turn);
        }
        "3" => {
            turn.session.pending = None;
            show_concepts(turn);
        }
        _ => turn.notice(MENU_RETRY),
    }
}

fn replay(turn: &mut Turn<'_>) {
    let engine = turn.engine;
    match replay_path(turn.phase()) {
        Some(path) if engine.dialogue.has_path(path) => turn.speak(path),
        _ => turn.say(Channel::Guide, NOTHING_TO_ADD),
    }
}

fn hint(turn: &mut Turn<'_>) {
    let engine = turn.engine;
    let direct_hit = turn.journey().is_some_and(|j| j.is_direct_hit);
    let path = hint_path(turn.phase(), direct_hit);
    if engine.dialogue.has_path(path) {
        turn.speak(path);
    } else {
        debug!(path, "no hint content; using fallback");
        turn.say(Channel::Guide, HINT_FALLBACK);
    }
    let context = turn.phase().to_string();
    turn.log_hint(&context);
}

fn show_concepts(turn: &mut Turn<'_>) {
    let indices = concepts_for_phase(turn.phase());
    if indices.is_empty() {
        turn.say(Channel::Guide, NO_CONCEPTS);
        return;
    }
    turn.say(Channel::Guide, "Concepts I can explain here:");
    for (n, &i) in indices.iter().enumerate() {
        turn.say(Channel::Guide, format!("  {}. {}", n + 1, CONCEPTS[i].0));
    }
    turn.say(Channel::Guide, "Choose the number of the concept you want to ask about.");
    turn.session.pending = Some(Pending::ConceptChoice(indices.to_vec()));
}

pub(crate) fn on_concept_reply(turn: &mut Turn<'_>, reply: &str) {
    let Some(Pending::ConceptChoice(indices)) = turn.session.pending.take() else {
        return;
    };
    let choice = match reply.trim().parse::<usize>() {
        Ok(n) if (1..=indices.len()).contains(&n) => n,
        Ok(_) => {
            turn.notice(format!("Please type a number between 1 and {}.", indices.len()));
            show_concepts(turn);
            return;
        }
        Err(_) => {
            turn.notice("Please type a number from the list.");
            show_concepts(turn);
            return;
        }
    };
    let key = format!("explanations.{}", CONCEPTS[indices[choice - 1]].1);
    let text = turn.line(&key).unwrap_or_else(|| NO_EXPLANATION.to_string());
    turn.say(Channel::Guide, text);
}
