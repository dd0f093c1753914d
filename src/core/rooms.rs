/// Region-entry transitions.
///
/// Each rule reads: in region R, when the phase is one of P and the journey
/// passes G, move to phase T, speak D, then run an optional follow-up. The
/// first matching rule wins. Page table floors share one rule keyed on the
/// title prefix; the floor number comes from the title suffix.

use tracing::{debug, warn};

use super::engine::Turn;
use super::guard::{JourneyGuard, PhaseGuard};
use super::{calculator, clock, phase, selection};
use crate::schema::event::Effect;
use crate::schema::journey::FaultSubtype;

pub const TERMINAL: &str = "Terminal";
pub const LEARNER_MODE: &str = "Learner Mode";
pub const ADVENTURER_MODE: &str = "Adventurer Mode";
pub const TLB_ROOM: &str = "TLB Room";
pub const CALCULATOR_ROOM: &str = "Calculator Room";
pub const PAGE_DIRECTORY: &str = "Page Table Library - Page Directory";
/// Followed by the floor number, e.g. `"Page Table Library - Page Table 2"`.
pub const PAGE_TABLE_FLOOR: &str = "Page Table Library - Page Table ";
pub const PERMISSION_CHAMBER: &str = "Permission Chamber";
pub const PAGE_FAULT_CORRIDOR: &str = "Page Fault Corridor";
pub const LAZY_ALLOCATION_ROOM: &str = "Lazy Allocation Room";
pub const COW_ROOM: &str = "COW Room";
pub const LAZY_LOADING_ROOM: &str = "Lazy Loading Room";
pub const DISK_ROOM: &str = "Disk Room";
pub const RAM_ROOM: &str = "RAM Room";
pub const SWAP_DISTRICT: &str = "Swap District";

/// Number of page table floors in the library.
pub const FLOORS: u32 = 3;

pub const RAM_MIX_SIGN: &str = "ramRoom.mixSign";

pub(crate) struct RoomRule {
    pub region: &'static str,
    pub from: PhaseGuard,
    pub journey: JourneyGuard,
    pub to: Option<&'static str>,
    pub speak: &'static [&'static str],
    pub then: Option<fn(&mut Turn<'_>)>,
}

const fn rule(
    region: &'static str,
    from: PhaseGuard,
    journey: JourneyGuard,
    to: Option<&'static str>,
    speak: &'static [&'static str],
    then: Option<fn(&mut Turn<'_>)>,
) -> RoomRule {
    RoomRule {
        region,
        from,
        journey,
        to,
        speak,
        then,
    }
}

use JourneyGuard as J;
use PhaseGuard::{Any, OneOf};

pub(crate) static ROOM_RULES: &[RoomRule] = &[
    // Terminal and mode selection
    rule(
        TERMINAL,
        Any,
        J::Any,
        Some(phase::TERMINAL_SPAWN),
        &["rooms.terminal.initial_spawn"],
        Some(abandon_prompts),
    ),
    rule(LEARNER_MODE, Any, J::Any, None, &["rooms.terminal.enter_learner"], None),
    rule(
        ADVENTURER_MODE,
        OneOf(&[
            phase::TERMINAL_SPAWN,
            phase::ADVENTURER_SELECT,
            phase::TERMINAL_JOURNEY_CHOSEN,
            phase::JOURNEY_COMPLETE,
        ]),
        J::Any,
        Some(phase::ADVENTURER_SELECT),
        &["rooms.terminal.enter_adventurer"],
        Some(selection::show_journey_list),
    ),
    // TLB
    rule(
        TLB_ROOM,
        OneOf(&[phase::TERMINAL_JOURNEY_CHOSEN]),
        J::Assigned,
        Some(phase::TLB_SPAWN),
        &["rooms.tlb_room.at_spawn"],
        None,
    ),
    rule(
        TLB_ROOM,
        OneOf(&[phase::CALCULATOR_SOLVED_TLB]),
        J::Assigned,
        Some(phase::TLB_LOOKUP),
        &["rooms.tlb_room.after_calculator"],
        Some(pose_tlb_quiz),
    ),
    // Calculator, two visits
    rule(
        CALCULATOR_ROOM,
        OneOf(&[phase::TLB_SPAWN, phase::CALCULATOR_FROM_TLB]),
        J::Assigned,
        Some(phase::CALCULATOR_FROM_TLB),
        &["rooms.calculator_room.from_tlb_spawn"],
        Some(calculator::show_instructions),
    ),
    rule(
        CALCULATOR_ROOM,
        OneOf(&[phase::LAZY_LOADING_ENTERED, phase::CALCULATOR_FROM_LAZY_LOADING]),
        J::Subtype(FaultSubtype::LazyLoading),
        Some(phase::CALCULATOR_FROM_LAZY_LOADING),
        &["rooms.calculator_room.from_lazy_loading_spawn"],
        Some(calculator::show_instructions),
    ),
    // Page table library
    rule(
        PAGE_DIRECTORY,
        OneOf(&[phase::TLB_AFTER_CALCULATOR]),
        J::PageWalk,
        Some(phase::PAGE_DIRECTORY),
        &[
            "rooms.page_table_library.entrance",
            "rooms.page_table_library.before_entering",
            "rooms.page_table_library.page_directory",
        ],
        None,
    ),
    rule(
        PAGE_DIRECTORY,
        OneOf(&[phase::CORRECT_FLOOR, phase::WRONG_FLOOR]),
        J::PageWalk,
        Some(phase::PAGE_DIRECTORY),
        &["rooms.page_table_library.page_directory"],
        None,
    ),
    rule(
        PAGE_TABLE_FLOOR,
        OneOf(&[phase::PAGE_DIRECTORY, phase::CORRECT_FLOOR, phase::WRONG_FLOOR]),
        J::PageWalk,
        None,
        &[],
        Some(route_floor),
    ),
    // Permission chamber
    rule(
        PERMISSION_CHAMBER,
        OneOf(&[phase::CORRECT_FLOOR]),
        J::PageWalk,
        Some(phase::PERMISSION_DECISION),
        &["rooms.permission_chamber.at_spawn"],
        Some(reset_chamber_signs),
    ),
    rule(
        PERMISSION_CHAMBER,
        OneOf(&[phase::TLB_AFTER_CALCULATOR]),
        J::DirectHit,
        Some(phase::PERMISSION_DECISION),
        &["rooms.permission_chamber.at_spawn"],
        Some(reset_chamber_signs),
    ),
    // Page faults
    rule(
        PAGE_FAULT_CORRIDOR,
        OneOf(&[phase::LAZY_ALLOC_DECISION, phase::LAZY_LOADING_ENTERED]),
        J::Assigned,
        Some(phase::PAGE_FAULT_CORRIDOR),
        &["rooms.page_fault_corridor.at_enter"],
        None,
    ),
    rule(
        LAZY_ALLOCATION_ROOM,
        OneOf(&[phase::PAGE_FAULT_CORRIDOR, phase::LAZY_ALLOC_DECISION]),
        J::Subtype(FaultSubtype::LazyAllocation),
        Some(phase::LAZY_ALLOC_DECISION),
        &["rooms.lazy_allocation_room.at_enter"],
        Some(lazy_alloc_first_signs),
    ),
    rule(
        LAZY_ALLOCATION_ROOM,
        OneOf(&[phase::RAM_CONTINUE_TO_LAZY_ALLOC]),
        J::Subtype(FaultSubtype::LazyAllocation),
        Some(phase::LAZY_ALLOC_COW),
        &["rooms.lazy_allocation_room.second_visit"],
        Some(lazy_alloc_second_visit),
    ),
    rule(
        COW_ROOM,
        OneOf(&[phase::COW_DECISION, phase::GOING_TO_COW]),
        J::CopyOnWrite,
        Some(phase::COW_DECISION),
        &["rooms.cow_room.at_spawn"],
        Some(cow_signs),
    ),
    rule(
        LAZY_LOADING_ROOM,
        OneOf(&[phase::PAGE_FAULT_CORRIDOR, phase::LAZY_LOADING_ENTERED]),
        J::Subtype(FaultSubtype::LazyLoading),
        Some(phase::LAZY_LOADING_ENTERED),
        &["rooms.lazy_loading_room.at_enter"],
        Some(loading_sign_to_calculator),
    ),
    rule(
        LAZY_LOADING_ROOM,
        OneOf(&[phase::CALCULATOR_SOLVED_LAZY_LOADING, phase::LAZY_LOADING_RETURNED]),
        J::Subtype(FaultSubtype::LazyLoading),
        Some(phase::LAZY_LOADING_RETURNED),
        &["rooms.lazy_loading_room.after_calculator"],
        Some(loading_sign_to_disk),
    ),
    rule(
        DISK_ROOM,
        OneOf(&[
            phase::LAZY_LOADING_RETURNED,
            phase::DISK_LAZY_LOADING,
            phase::DISK_SWAP_RETRIEVAL,
        ]),
        J::Assigned,
        None,
        &["rooms.disk_room.at_spawn"],
        Some(enter_disk),
    ),
    // RAM: one rule per arrival phase
    rule(
        RAM_ROOM,
        OneOf(&[phase::RAM_ALLOW_ACCESS]),
        J::Assigned,
        None,
        &["rooms.ram_room.at_spawn", "rooms.ram_room.allow_access"],
        Some(ram_sign_confirm),
    ),
    rule(
        RAM_ROOM,
        OneOf(&[phase::RAM_AFTER_LAZY_ALLOC]),
        J::Assigned,
        None,
        &["rooms.ram_room.at_spawn", "rooms.ram_room.after_lazy_alloc_first"],
        Some(ram_sign_retry),
    ),
    rule(
        RAM_ROOM,
        OneOf(&[phase::RAM_AFTER_COW]),
        J::SwapAfterCow,
        None,
        &["rooms.ram_room.at_spawn", "rooms.ram_room.ram_full_need_swap"],
        Some(ram_sign_continue),
    ),
    rule(
        RAM_ROOM,
        OneOf(&[phase::RAM_AFTER_COW]),
        J::FinishAfterCow,
        None,
        &["rooms.ram_room.at_spawn", "rooms.ram_room.after_cow_pure"],
        Some(ram_sign_retry),
    ),
    rule(
        RAM_ROOM,
        OneOf(&[phase::DISK_SWAP_RETRIEVAL]),
        J::Subtype(FaultSubtype::SwappedOut),
        None,
        &["rooms.ram_room.at_spawn", "rooms.ram_room.from_disk_swap_out"],
        Some(ram_sign_retry),
    ),
    rule(
        RAM_ROOM,
        OneOf(&[phase::DISK_LAZY_LOADING]),
        J::Subtype(FaultSubtype::LazyLoading),
        None,
        &["rooms.ram_room.at_spawn", "rooms.ram_room.ram_full_need_swap"],
        Some(ram_sign_continue),
    ),
    rule(
        RAM_ROOM,
        OneOf(&[phase::SWAP_EVICTED]),
        J::Swap,
        None,
        &["rooms.ram_room.at_spawn"],
        Some(after_swap),
    ),
    rule(RAM_ROOM, Any, J::Any, None, &["rooms.ram_room.at_spawn"], None),
    // Swap district
    rule(
        SWAP_DISTRICT,
        OneOf(&[phase::DISK_LAZY_LOADING, phase::RAM_AFTER_COW]),
        J::Swap,
        Some(phase::SWAP_ENTERED),
        &["rooms.swap_district.at_spawn"],
        Some(start_clock),
    ),
];

/// Every region title the rules know. Floors are listed individually.
pub fn known_regions() -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for r in ROOM_RULES {
        if r.region == PAGE_TABLE_FLOOR {
            for floor in 1..=FLOORS {
                titles.push(format!("{}{}", PAGE_TABLE_FLOOR, floor));
            }
        } else {
            titles.push(r.region.to_string());
        }
    }
    titles.sort();
    titles.dedup();
    titles
}

/// Split a floor title into the shared rule key and its number.
fn rule_key(title: &str) -> Option<(&'static str, Option<u32>)> {
    if let Some(suffix) = title.strip_prefix(PAGE_TABLE_FLOOR) {
        return suffix
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=FLOORS).contains(n))
            .map(|n| (PAGE_TABLE_FLOOR, Some(n)));
    }
    ROOM_RULES
        .iter()
        .find(|r| r.region == title)
        .map(|r| (r.region, None))
}

pub(crate) fn enter(turn: &mut Turn<'_>, title: &str) {
    let Some((key, floor)) = rule_key(title) else {
        warn!(player = turn.session.player.0, region = title, "unknown region");
        return;
    };

    if !turn.phase_is_declared() {
        return;
    }

    turn.push(Effect::InterruptDialogue);
    let engine = turn.engine;
    let anchor = engine.world.regions.by_title(title).and_then(|r| r.anchor);
    turn.push(Effect::MoveGuide { anchor });

    let journey = turn.journey();
    let rule = ROOM_RULES.iter().find(|r| {
        r.region == key && r.from.allows(turn.phase()) && r.journey.allows(journey)
    });
    let Some(rule) = rule else {
        debug!(region = title, phase = %turn.phase(), "no transition for region entry");
        return;
    };

    if let Some(n) = floor {
        turn.set_var("floor", n.to_string());
    }
    if let Some(next) = rule.to {
        turn.set_phase(next);
    }
    for path in rule.speak {
        turn.speak(path);
    }
    if let Some(then) = rule.then {
        then(turn);
    }
}

fn abandon_prompts(turn: &mut Turn<'_>) {
    turn.session.pending = None;
    turn.session.clock = None;
    turn.session.calculating = false;
}

fn pose_tlb_quiz(turn: &mut Turn<'_>) {
    let result = match turn.journey() {
        Some(j) if j.is_direct_hit => "rooms.tlb_room.hit_result",
        _ => "rooms.tlb_room.miss_result",
    };
    super::prompt::pose_quiz(turn, "tlb_room.hit_or_miss", phase::TLB_AFTER_CALCULATOR, Some(result));
}

fn route_floor(turn: &mut Turn<'_>) {
    let floor = turn.var("floor").to_string();
    let expected = turn.var("expectedFloor").to_string();
    if expected == "?" || expected == floor {
        turn.set_phase(phase::CORRECT_FLOOR);
        turn.speak("rooms.page_table_library.correct_floor");
    } else {
        turn.set_phase(phase::WRONG_FLOOR);
        turn.speak("rooms.page_table_library.wrong_floor");
    }
}

fn reset_chamber_signs(turn: &mut Turn<'_>) {
    let texts = [
        "Allow Access",
        "Page Fault",
        "Segmentation/Fault",
        "Permission/Fault",
        "Make Your/Decision",
        "",
    ];
    for (sign, text) in super::checkpoint::PERMISSION_SIGNS.iter().zip(texts) {
        turn.sign(sign, text);
    }
}

fn lazy_alloc_first_signs(turn: &mut Turn<'_>) {
    turn.sign("lazyAllocation.allocateSign", "Allocate");
    turn.sign("lazyAllocation.swapSign", "Swap from/Disk");
    turn.sign("lazyAllocation.mixSign", "");
}

fn lazy_alloc_second_visit(turn: &mut Turn<'_>) {
    if let Some(journey) = turn.journey() {
        journey.apply_second_visit(&mut turn.session.state.vars);
    }
    turn.sign("lazyAllocation.allocateSign", "");
    turn.sign("lazyAllocation.swapSign", "");
    turn.sign("lazyAllocation.mixSign", "Deny the write");
    turn.sign("lazyAllocation.cowSign", "Do COW");
    turn.sign("lazyAllocation.doNothingSign", "Do nothing");
    turn.sign("lazyAllocation.writeSign", "Process wants/to write. What/do you do?");
}

fn cow_signs(turn: &mut Turn<'_>) {
    turn.sign("cowRoom.toRamSign", "");
}

fn loading_sign_to_calculator(turn: &mut Turn<'_>) {
    turn.sign("lazyLoading.tpSign", "Go to/Calculator/Room");
}

fn loading_sign_to_disk(turn: &mut Turn<'_>) {
    turn.sign("lazyLoading.tpSign", "Go to Disk");
}

fn enter_disk(turn: &mut Turn<'_>) {
    let Some(journey) = turn.journey() else {
        return;
    };
    if let Some(next) = journey.disk_phase() {
        turn.set_phase(next);
    }
    if let Some(prompt) = journey.disk_prompt_dialogue() {
        turn.speak(prompt);
    }
}

fn ram_sign_confirm(turn: &mut Turn<'_>) {
    turn.sign(RAM_MIX_SIGN, "CONFIRM");
}

fn ram_sign_retry(turn: &mut Turn<'_>) {
    turn.sign(RAM_MIX_SIGN, "RETRY/INSTRUCTION");
}

fn ram_sign_continue(turn: &mut Turn<'_>) {
    turn.sign(RAM_MIX_SIGN, "CONTINUE");
}

fn after_swap(turn: &mut Turn<'_>) {
    let Some(journey) = turn.journey() else {
        return;
    };
    if let Some(next) = journey.phase_after_swap() {
        turn.set_phase(next);
    }
    if let Some(path) = journey.dialogue_after_swap() {
        turn.speak(path);
    }
    ram_sign_retry(turn);
}

fn start_clock(turn: &mut Turn<'_>) {
    if let Some(journey) = turn.journey() {
        journey.apply_swap_entry(&mut turn.session.state.vars);
    }
    clock::start(turn);
}

/// Dialogue paths the room rules and their follow-ups speak.
pub(crate) fn dialogue_paths() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = ROOM_RULES.iter().flat_map(|r| r.speak.iter().copied()).collect();
    paths.extend([
        "rooms.tlb_room.hit_result",
        "rooms.tlb_room.miss_result",
        "rooms.page_table_library.correct_floor",
        "rooms.page_table_library.wrong_floor",
        "rooms.disk_room.lazy_loading_prompt",
        "rooms.disk_room.swap_retrieval_prompt",
        "rooms.ram_room.after_swap_for_lazy_loading",
        "rooms.ram_room.after_swap_for_lazy_alloc",
    ]);
    paths.sort();
    paths.dedup();
    paths
}

/// Phases named by the rules, as guards or targets.
pub(crate) fn referenced_phases() -> Vec<&'static str> {
    let mut phases = Vec::new();
    for r in ROOM_RULES {
        phases.extend_from_slice(r.from.phases());
        phases.extend(r.to);
    }
    phases
}
