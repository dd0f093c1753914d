/// Second-chance (clock) page replacement, played with six frame buttons.
///
/// Round one walks the hand over every frame and clears its use bit. After
/// that every frame except the victim is touched again, so in round two only
/// the victim still has a clear bit.

use tracing::debug;

use super::engine::Turn;
use super::phase;
use crate::schema::address::parse_hex_var;
use crate::schema::event::Channel;

pub const FRAMES: usize = 6;

pub const NOT_VICTIM: &str = "Frame {frame} was recently used. Its use bit is set, so it gets a second chance.";
pub const BIT_CLEARED: &str = "Frame {frame}: use bit cleared. The hand moves on.";
pub const ALREADY_CLEARED: &str = "Frame {frame} is already cleared. Check the others.";
pub const ROUND_TWO: &str = "Every frame has been checked once. Some pages were used again since. Find the frame whose use bit is still clear.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockPuzzle {
    /// Frame number, 1-based.
    victim: usize,
    round: u8,
    pressed: [bool; FRAMES],
    lit: [bool; FRAMES],
}

impl ClockPuzzle {
    /// Every use bit starts set. `victim` is clamped into the frame range.
    pub fn new(victim: usize) -> Self {
        Self {
            victim: victim.clamp(1, FRAMES),
            round: 1,
            pressed: [false; FRAMES],
            lit: [true; FRAMES],
        }
    }

    pub fn victim(&self) -> usize {
        self.victim
    }

    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn is_lit(&self, frame: usize) -> bool {
        frame >= 1 && frame <= FRAMES && self.lit[frame - 1]
    }

    fn press(&mut self, frame: usize) -> ClockOutcome {
        let i = frame - 1;
        if self.round == 1 {
            if self.pressed[i] {
                return ClockOutcome::AlreadyCleared;
            }
            self.pressed[i] = true;
            self.lit[i] = false;
            if self.pressed.iter().all(|p| *p) {
                self.round = 2;
                for (n, lit) in self.lit.iter_mut().enumerate() {
                    *lit = n + 1 != self.victim;
                }
                return ClockOutcome::RoundTwo;
            }
            ClockOutcome::Cleared
        } else if frame == self.victim {
            ClockOutcome::VictimFound
        } else {
            ClockOutcome::SecondChance
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockOutcome {
    Cleared,
    AlreadyCleared,
    RoundTwo,
    SecondChance,
    VictimFound,
}

pub fn frame_button(frame: usize) -> String {
    format!("frame{}btn", frame)
}

pub fn torch(frame: usize) -> String {
    format!("swapDistrict.torch{}", frame)
}

/// `"frame3btn"` -> `Some(3)`.
pub fn frame_number(button: &str) -> Option<usize> {
    button
        .strip_prefix("frame")?
        .strip_suffix("btn")?
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=FRAMES).contains(n))
}

/// Begin the puzzle with the current `pfn` as the victim.
pub(crate) fn start(turn: &mut Turn<'_>) {
    let victim = parse_hex_var(turn.var("pfn")).unwrap_or(1) as usize;
    let puzzle = ClockPuzzle::new(victim);
    debug!(player = turn.session.player.0, victim = puzzle.victim(), "clock puzzle started");
    for frame in 1..=FRAMES {
        turn.indicator(torch(frame), true);
    }
    turn.session.clock = Some(puzzle);
}

pub(crate) fn press(turn: &mut Turn<'_>, frame: usize) {
    if turn.phase() != phase::SWAP_ENTERED {
        debug!(frame, phase = %turn.phase(), "frame pressed outside the clock puzzle");
        return;
    }
    let Some(puzzle) = turn.session.clock.as_mut() else {
        debug!(frame, "no clock puzzle running");
        return;
    };
    let outcome = puzzle.press(frame);
    let lit = puzzle.lit;
    let text = |template: &str| template.replace("{frame}", &frame.to_string());

    match outcome {
        ClockOutcome::Cleared => {
            turn.indicator(torch(frame), false);
            turn.say(Channel::Clock, text(BIT_CLEARED));
        }
        ClockOutcome::AlreadyCleared => turn.say(Channel::Clock, text(ALREADY_CLEARED)),
        ClockOutcome::RoundTwo => {
            for (n, on) in lit.iter().enumerate() {
                turn.indicator(torch(n + 1), *on);
            }
            turn.say(Channel::Clock, ROUND_TWO);
        }
        ClockOutcome::SecondChance => turn.say(Channel::Clock, text(NOT_VICTIM)),
        ClockOutcome::VictimFound => {
            turn.set_var("victim", frame.to_string());
            turn.set_phase(phase::SWAP_VICTIM_FOUND);
            turn.speak("rooms.swap_district.victim_found");
        }
    }
}

/// Eviction done; the puzzle is over.
pub(crate) fn finish(turn: &mut Turn<'_>) {
    turn.session.clock = None;
}
