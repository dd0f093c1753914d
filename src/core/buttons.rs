/// Button presses.
///
/// Clock frame buttons go to the swap puzzle. Everything else is looked up
/// in `BUTTON_RULES` first and then among the decision buttons of the
/// checkpoint the player is standing at.

use tracing::{debug, warn};

use super::checkpoint::{self, Checkpoint};
use super::engine::Turn;
use super::guard::{JourneyGuard, PhaseGuard};
use super::prompt::{self, Pending, PendingKind};
use super::rooms::RAM_MIX_SIGN;
use super::{calculator, clock, phase};

pub const RAM_MIX: &str = "ramMix";
pub const PER_TERMINATE: &str = "perTerminate";
pub const COW_TO_RAM: &str = "cowToRam";
pub const BTN_LAZY_ALLOC: &str = "btnLazyAlloc";
pub const LOADING_TP: &str = "loadingTp";
pub const DISK_TO_RAM: &str = "diskToRam";
pub const SKIP_CALC: &str = "skipCalc";
pub const SWAP_LEVER: &str = "swapLever";

/// Teleport destinations.
pub mod destination {
    pub const RAM_ROOM: &str = "ramRoom";
    pub const COW_ROOM: &str = "cowRoom";
    pub const DISK_ROOM: &str = "diskRoom";
    pub const CALCULATOR_ROOM: &str = "calculatorRoom";
    pub const PAGE_FAULT_CORRIDOR: &str = "pageFaultCorridor";
    pub const LAZY_ALLOCATION_ROOM: &str = "lazyAllocationRoom";
    pub const SWAP_DISTRICT: &str = "swapDistrict";
    pub const END_TERMINAL: &str = "endTerminal";

    pub const ALL: &[&str] = &[
        RAM_ROOM,
        COW_ROOM,
        DISK_ROOM,
        CALCULATOR_ROOM,
        PAGE_FAULT_CORRIDOR,
        LAZY_ALLOCATION_ROOM,
        SWAP_DISTRICT,
        END_TERMINAL,
    ];
}

pub(crate) struct ButtonRule {
    pub button: &'static str,
    pub from: PhaseGuard,
    pub journey: JourneyGuard,
    pub to: Option<&'static str>,
    /// `(display, text)` written after the phase change.
    pub sign: Option<(&'static str, &'static str)>,
    pub teleport: Option<&'static str>,
    pub speak: &'static [&'static str],
    pub then: Option<fn(&mut Turn<'_>)>,
}

const BLANK: ButtonRule = ButtonRule {
    button: "",
    from: PhaseGuard::Any,
    journey: JourneyGuard::Assigned,
    to: None,
    sign: None,
    teleport: None,
    speak: &[],
    then: None,
};

const fn go(button: &'static str, from: &'static [&'static str], place: &'static str) -> ButtonRule {
    ButtonRule {
        button,
        from: PhaseGuard::OneOf(from),
        teleport: Some(place),
        ..BLANK
    }
}

use destination as dest;
use JourneyGuard as J;
use PhaseGuard::OneOf;

pub(crate) static BUTTON_RULES: &[ButtonRule] = &[
    // RAM room: one button, meaning depends on the phase
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::RAM_ALLOW_ACCESS]),
        then: Some(ram_confirm),
        ..BLANK
    },
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::RAM_RETRY_TLB_MISS]),
        to: Some(phase::RAM_FINISH),
        sign: Some((RAM_MIX_SIGN, "FINISH")),
        speak: &["rooms.ram_room.retry_done"],
        ..BLANK
    },
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::RAM_AFTER_LAZY_ALLOC]),
        to: Some(phase::RAM_CONTINUE_TO_LAZY_ALLOC),
        sign: Some((RAM_MIX_SIGN, "CONTINUE")),
        speak: &["rooms.ram_room.lazy_alloc_retry_done"],
        ..BLANK
    },
    go(RAM_MIX, &[phase::RAM_CONTINUE_TO_LAZY_ALLOC], dest::LAZY_ALLOCATION_ROOM),
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::RAM_AFTER_COW]),
        journey: J::SwapAfterCow,
        teleport: Some(dest::SWAP_DISTRICT),
        ..BLANK
    },
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::RAM_AFTER_COW]),
        journey: J::FinishAfterCow,
        to: Some(phase::RAM_FINISH),
        sign: Some((RAM_MIX_SIGN, "FINISH")),
        speak: &["rooms.ram_room.retry_done"],
        ..BLANK
    },
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::DISK_SWAP_RETRIEVAL, phase::SWAP_LAZY_LOADING, phase::SWAP_LAZY_ALLOC]),
        to: Some(phase::RAM_FINISH),
        sign: Some((RAM_MIX_SIGN, "FINISH")),
        speak: &["rooms.ram_room.retry_done"],
        ..BLANK
    },
    go(RAM_MIX, &[phase::DISK_LAZY_LOADING], dest::SWAP_DISTRICT),
    ButtonRule {
        button: RAM_MIX,
        from: OneOf(&[phase::RAM_FINISH]),
        then: Some(finish_journey),
        ..BLANK
    },
    // Permission chamber exit
    go(PER_TERMINATE, &[phase::RAM_ALLOW_ACCESS], dest::RAM_ROOM),
    go(
        PER_TERMINATE,
        &[phase::LAZY_ALLOC_DECISION, phase::LAZY_LOADING_ENTERED],
        dest::PAGE_FAULT_CORRIDOR,
    ),
    go(PER_TERMINATE, &[phase::DISK_SWAP_RETRIEVAL], dest::DISK_ROOM),
    ButtonRule {
        button: PER_TERMINATE,
        from: OneOf(&[phase::COW_DECISION]),
        journey: J::CopyOnWrite,
        teleport: Some(dest::COW_ROOM),
        ..BLANK
    },
    ButtonRule {
        button: PER_TERMINATE,
        from: OneOf(&[phase::SEGFAULT_END]),
        to: Some(phase::SEGFAULT_FINISH),
        sign: Some((checkpoint::PERMISSION_SIGNS[5], "Finish")),
        speak: &["rooms.permission_chamber.process_terminated"],
        ..BLANK
    },
    ButtonRule {
        button: PER_TERMINATE,
        from: OneOf(&[phase::SEGFAULT_FINISH]),
        then: Some(finish_journey),
        ..BLANK
    },
    // Room exits
    go(COW_TO_RAM, &[phase::RAM_AFTER_COW], dest::RAM_ROOM),
    go(BTN_LAZY_ALLOC, &[phase::RAM_AFTER_LAZY_ALLOC], dest::RAM_ROOM),
    go(BTN_LAZY_ALLOC, &[phase::GOING_TO_COW], dest::COW_ROOM),
    go(LOADING_TP, &[phase::LAZY_LOADING_ENTERED], dest::CALCULATOR_ROOM),
    go(LOADING_TP, &[phase::LAZY_LOADING_RETURNED], dest::DISK_ROOM),
    go(
        DISK_TO_RAM,
        &[phase::DISK_LAZY_LOADING, phase::DISK_SWAP_RETRIEVAL],
        dest::RAM_ROOM,
    ),
    // Calculator shortcut
    ButtonRule {
        button: SKIP_CALC,
        from: OneOf(&[phase::CALCULATOR_FROM_TLB, phase::CALCULATOR_FROM_LAZY_LOADING]),
        then: Some(calculator::skip),
        ..BLANK
    },
    // Swap district lever
    ButtonRule {
        button: SWAP_LEVER,
        from: OneOf(&[phase::SWAP_VICTIM_FOUND]),
        journey: J::Swap,
        to: Some(phase::SWAP_EVICTED),
        speak: &["rooms.swap_district.after_eviction"],
        then: Some(clock::finish),
        ..BLANK
    },
    ButtonRule {
        button: SWAP_LEVER,
        from: OneOf(&[phase::SWAP_ENTERED]),
        journey: J::Swap,
        speak: &["rooms.swap_district.lever_locked"],
        ..BLANK
    },
];

/// Button ids the engine reacts to, including clock frames and decisions.
pub fn known_buttons() -> Vec<String> {
    let mut ids: Vec<String> = BUTTON_RULES.iter().map(|r| r.button.to_string()).collect();
    ids.extend((1..=clock::FRAMES).map(clock::frame_button));
    for checkpoint in Checkpoint::ALL {
        ids.extend(checkpoint.buttons().iter().map(|d| d.button.to_string()));
    }
    ids.sort();
    ids.dedup();
    ids
}

pub(crate) fn press(turn: &mut Turn<'_>, button: &str) {
    if !turn.phase_is_declared() {
        return;
    }

    if let Some(frame) = clock::frame_number(button) {
        clock::press(turn, frame);
        return;
    }

    let journey = turn.journey();
    let rule = BUTTON_RULES.iter().find(|r| {
        r.button == button && r.from.allows(turn.phase()) && r.journey.allows(journey)
    });
    if let Some(rule) = rule {
        apply(turn, rule);
        return;
    }

    let decision = Checkpoint::for_phase(turn.phase())
        .and_then(|checkpoint| checkpoint.button(button).map(|d| (checkpoint, d)));
    if let Some((checkpoint, decision)) = decision {
        match turn.session.pending.as_ref().map(Pending::kind) {
            Some(PendingKind::Quiz) => {
                debug!(button, "quiz pending; decision ignored");
                prompt::reissue(turn);
                return;
            }
            Some(PendingKind::Confirmation) => {
                debug!(button, "confirmation replaced");
            }
            Some(PendingKind::GuideMenu | PendingKind::ConceptChoice) => {
                turn.session.pending = None;
            }
            None => {}
        }
        checkpoint::press(turn, checkpoint, decision);
        return;
    }

    if known_buttons().iter().any(|id| id == button) {
        debug!(button, phase = %turn.phase(), "button has no effect in this phase");
    } else {
        warn!(player = turn.session.player.0, button, "unknown button");
    }
}

fn apply(turn: &mut Turn<'_>, rule: &ButtonRule) {
    if let Some(next) = rule.to {
        turn.set_phase(next);
    }
    if let Some((display, text)) = rule.sign {
        turn.sign(display, text);
    }
    for path in rule.speak {
        turn.speak(path);
    }
    if let Some(place) = rule.teleport {
        turn.teleport(place);
    }
    if let Some(then) = rule.then {
        then(turn);
    }
}

fn ram_confirm(turn: &mut Turn<'_>) {
    let Some(journey) = turn.journey() else {
        return;
    };
    let next = journey.phase_after_ram_confirm();
    turn.set_phase(next);
    if next == phase::RAM_FINISH {
        turn.speak("rooms.ram_room.access_confirmed");
        turn.sign(RAM_MIX_SIGN, "FINISH");
    } else {
        turn.speak("rooms.ram_room.retry_tlb_miss");
        turn.sign(RAM_MIX_SIGN, "RETRY/INSTRUCTION");
    }
}

/// Mark the journey complete and send the player back to the terminal.
fn finish_journey(turn: &mut Turn<'_>) {
    let Some(journey) = turn.journey() else {
        return;
    };
    turn.mark_complete(journey.id);
    turn.session.pending = None;
    turn.teleport(destination::END_TERMINAL);
    turn.set_phase(phase::JOURNEY_COMPLETE);
    turn.speak("rooms.terminal.journey_complete");
}

pub(crate) fn dialogue_paths() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = BUTTON_RULES.iter().flat_map(|r| r.speak.iter().copied()).collect();
    paths.extend([
        "rooms.ram_room.access_confirmed",
        "rooms.ram_room.retry_tlb_miss",
        "rooms.terminal.journey_complete",
    ]);
    paths.sort();
    paths.dedup();
    paths
}

pub(crate) fn displays() -> Vec<&'static str> {
    let mut displays: Vec<&'static str> = BUTTON_RULES.iter().filter_map(|r| r.sign.map(|(d, _)| d)).collect();
    displays.sort();
    displays.dedup();
    displays
}

pub(crate) fn referenced_phases() -> Vec<&'static str> {
    let mut phases = Vec::new();
    for r in BUTTON_RULES {
        phases.extend_from_slice(r.from.phases());
        phases.extend(r.to);
    }
    phases
}
