/// What the transition tables expect content to provide.
///
/// The builder checks `referenced_phases` against the phase vocabulary; the
/// content linter checks a content directory against `ContentManifest`.

use super::checkpoint::{self, Checkpoint};
use super::{buttons, calculator, clock, guide, prompt, rooms};
use crate::schema::journey::JourneyCatalog;

/// Every phase tag named by the room, button and checkpoint tables.
pub fn referenced_phases() -> Vec<&'static str> {
    let mut phases = rooms::referenced_phases();
    phases.extend(buttons::referenced_phases());
    phases.extend(Checkpoint::ALL.iter().map(|c| c.phase()));
    phases.sort_unstable();
    phases.dedup();
    phases
}

#[derive(Debug, Clone, Default)]
pub struct ContentManifest {
    /// Dialogue the engine speaks unconditionally when it gets there.
    pub dialogue: Vec<String>,
    /// Hints and explanations; the engine falls back when these are missing.
    pub optional_dialogue: Vec<String>,
    pub questions: Vec<String>,
    pub regions: Vec<String>,
    pub buttons: Vec<String>,
    pub displays: Vec<String>,
    pub destinations: Vec<String>,
    /// Every var key any journey can set, plus the keys set while playing.
    pub vars: Vec<String>,
}

impl ContentManifest {
    pub fn build(catalog: &JourneyCatalog) -> Self {
        let mut dialogue: Vec<String> = rooms::dialogue_paths().into_iter().map(str::to_string).collect();
        dialogue.extend(buttons::dialogue_paths().into_iter().map(str::to_string));
        dialogue.extend(checkpoint::dialogue_paths());
        dialogue.extend(
            [
                "rooms.terminal.journey_selected",
                "rooms.terminal.journey_random",
                "rooms.swap_district.victim_found",
            ]
            .map(str::to_string),
        );

        let mut optional_dialogue: Vec<String> = Vec::new();
        for tag in crate::core::phase::BUILT_IN {
            optional_dialogue.push(guide::hint_path(tag, false).to_string());
            optional_dialogue.push(guide::hint_path(tag, true).to_string());
        }
        optional_dialogue.extend(
            guide::CONCEPTS
                .iter()
                .map(|(_, key)| format!("explanations.{}", key)),
        );

        let questions = [
            prompt::CONFIRM_QUESTION,
            "tlb_room.hit_or_miss",
            "calculator_room.binary_split",
            "calculator_room.page_index",
        ]
        .map(str::to_string)
        .to_vec();

        let mut displays: Vec<String> = buttons::displays().into_iter().map(str::to_string).collect();
        displays.extend(checkpoint::PERMISSION_SIGNS.map(str::to_string));
        displays.extend(
            [
                rooms::RAM_MIX_SIGN,
                "lazyAllocation.allocateSign",
                "lazyAllocation.swapSign",
                "lazyAllocation.mixSign",
                "lazyAllocation.cowSign",
                "lazyAllocation.doNothingSign",
                "lazyAllocation.writeSign",
                "lazyLoading.tpSign",
                "cowRoom.toRamSign",
            ]
            .map(str::to_string),
        );
        for n in 1..=6 {
            displays.push(calculator::calculation_frame(n));
            displays.push(calculator::instruction_frame(n));
        }

        let mut vars: Vec<String> = [
            "journey", "va", "hex", "vaBin", "process", "operation", "instruction", "vpn",
            "vpnHex", "offset", "offsetHex", "pfn", "pfnCow", "expectedFloor", "tlbResult",
            "optA", "optB", "optC", "button", "floor", "slot", "victim",
        ]
        .map(str::to_string)
        .to_vec();
        for journey in catalog.iter() {
            vars.extend(journey.scenario.extra.iter().map(|(k, _)| k.to_string()));
        }

        let mut manifest = ContentManifest {
            dialogue,
            optional_dialogue,
            questions,
            regions: rooms::known_regions(),
            buttons: buttons::known_buttons(),
            displays,
            destinations: buttons::destination::ALL.iter().map(|d| d.to_string()).collect(),
            vars,
        };
        manifest.normalize();
        manifest
    }

    /// Clock torches are indicators, listed with displays.
    pub fn indicators() -> Vec<String> {
        (1..=clock::FRAMES).map(clock::torch).collect()
    }

    fn normalize(&mut self) {
        for list in [
            &mut self.dialogue,
            &mut self.optional_dialogue,
            &mut self.questions,
            &mut self.regions,
            &mut self.buttons,
            &mut self.displays,
            &mut self.destinations,
            &mut self.vars,
        ] {
            list.sort();
            list.dedup();
        }
        self.optional_dialogue.retain(|p| !self.dialogue.contains(p));
    }
}
