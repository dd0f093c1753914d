/// The address calculator: splits a number into VPN and offset on six
/// wall displays, after a short pretend "working" delay.

use tracing::debug;

use super::engine::Turn;
use super::{phase, prompt};
use crate::schema::address::{parse_number, AddressSplit};
use crate::schema::event::{Channel, Trigger};

pub const PROCESSING: &str = "Processing...";
pub const HELP: &str = "Type an address as hex (0x2A), binary (0b101010) or decimal (42).";

pub fn calculation_frame(n: usize) -> String {
    format!("calculatorRoom.calculationFrame{}", n)
}

pub fn instruction_frame(n: usize) -> String {
    format!("calculatorRoom.instructionsFrame{}", n)
}

const INSTRUCTIONS: [[&str; 4]; 6] = [
    ["ADDRESS", "CALCULATOR", "", ""],
    ["Type the", "virtual address", "in chat", ""],
    ["Hex: 0x2A", "Binary: 0b101010", "Decimal: 42", ""],
    ["Top bits", "= VPN", "", ""],
    ["Low 4 bits", "= Offset", "", ""],
    ["Then answer", "the quiz", "", ""],
];

fn in_calculator(phase: &str) -> bool {
    phase == phase::CALCULATOR_FROM_TLB || phase == phase::CALCULATOR_FROM_LAZY_LOADING
}

fn lines(parts: [&str; 4]) -> [String; 4] {
    parts.map(str::to_string)
}

pub(crate) fn show_instructions(turn: &mut Turn<'_>) {
    for (i, frame) in INSTRUCTIONS.iter().enumerate() {
        turn.display(&instruction_frame(i + 1), lines(*frame));
    }
}

pub(crate) fn on_input(turn: &mut Turn<'_>, input: &str) {
    if !in_calculator(turn.phase()) {
        debug!(phase = %turn.phase(), "calculator input outside a calculator phase");
        return;
    }
    if turn.session.calculating {
        debug!(player = turn.session.player.0, "calculation already running; input ignored");
        return;
    }
    turn.session.calculating = true;
    for n in 1..=6 {
        turn.display(&calculation_frame(n), lines(["WORKING", "", "", ""]));
    }
    turn.say(Channel::Calculator, PROCESSING);
    let delay = turn.engine.config.calculation_delay();
    turn.schedule(delay, Trigger::CalculationReady(input.to_string()));
}

pub(crate) fn on_ready(turn: &mut Turn<'_>, input: &str) {
    turn.session.calculating = false;
    if !in_calculator(turn.phase()) {
        debug!(phase = %turn.phase(), "player left the calculator; result dropped");
        return;
    }
    match parse_number(input) {
        Ok(value) => {
            let split = turn.engine.layout.split(value);
            show_result(turn, &split);
        }
        Err(err) => {
            debug!(input, %err, "calculator input rejected");
            turn.say(Channel::Calculator, format!("{}. {}", err, HELP));
        }
    }
}

/// Work out the journey's own address at once.
pub(crate) fn skip(turn: &mut Turn<'_>) {
    let Some(journey) = turn.journey() else {
        return;
    };
    turn.session.calculating = false;
    let split = turn.engine.layout.split(journey.scenario.virtual_address);
    show_result(turn, &split);
}

fn show_result(turn: &mut Turn<'_>, split: &AddressSplit) {
    let frames: [[String; 4]; 6] = [
        ["Binary".into(), split.binary(), String::new(), String::new()],
        ["VPN".into(), split.vpn_binary(), String::new(), String::new()],
        ["Offset".into(), split.offset_binary(), String::new(), String::new()],
        ["Decimal".into(), split.value.to_string(), String::new(), String::new()],
        ["Hex".into(), split.hex(), String::new(), String::new()],
        ["VPN / Offset".into(), split.vpn_hex(), split.offset_hex(), String::new()],
    ];
    for (i, frame) in frames.into_iter().enumerate() {
        turn.display(&calculation_frame(i + 1), frame);
    }
    turn.say(Channel::Calculator, split.summary());

    let (quiz, solved) = if turn.phase() == phase::CALCULATOR_FROM_LAZY_LOADING {
        ("calculator_room.page_index", phase::CALCULATOR_SOLVED_LAZY_LOADING)
    } else {
        ("calculator_room.binary_split", phase::CALCULATOR_SOLVED_TLB)
    };
    prompt::pose_quiz(turn, quiz, solved, None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ids() {
        assert_eq!(calculation_frame(3), "calculatorRoom.calculationFrame3");
        assert_eq!(instruction_frame(1), "calculatorRoom.instructionsFrame1");
    }

    #[test]
    fn only_calculator_phases_accept_input() {
        assert!(in_calculator(phase::CALCULATOR_FROM_TLB));
        assert!(in_calculator(phase::CALCULATOR_FROM_LAZY_LOADING));
        assert!(!in_calculator(phase::CALCULATOR_SOLVED_TLB));
    }
}
