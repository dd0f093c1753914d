//! Shared helpers: a single player walking the shipped content.

#![allow(dead_code)]

use oscity_engine::config::EngineConfig;
use oscity_engine::core::engine::{PlayerSession, ProgressionEngine, Reaction};
use oscity_engine::schema::event::{Effect, Trigger};
use oscity_engine::schema::journey::JourneyId;
use oscity_engine::schema::player::PlayerId;

pub fn engine() -> ProgressionEngine {
    let config = EngineConfig {
        seed: 42,
        ..EngineConfig::default()
    };
    ProgressionEngine::builder()
        .content_dir("content")
        .config(config)
        .build()
        .unwrap()
}

pub struct Walk<'a> {
    pub engine: &'a ProgressionEngine,
    pub session: PlayerSession,
    /// Every reaction so far, oldest first.
    pub log: Vec<Reaction>,
}

impl<'a> Walk<'a> {
    /// A fresh player who has already finished every journey before `next`.
    pub fn new(engine: &'a ProgressionEngine, next: u8) -> Self {
        let completed = (1..next).map(JourneyId);
        let mut session = engine.open_session(PlayerId(1), completed);
        let joined = engine.on_join(&mut session);
        Self {
            engine,
            session,
            log: vec![joined],
        }
    }

    fn keep(&mut self, reaction: Reaction) -> &Reaction {
        self.log.push(reaction);
        self.log.last().unwrap()
    }

    pub fn enter(&mut self, title: &str) -> &Reaction {
        let reaction = self.engine.on_region_entered(&mut self.session, Some(title));
        self.keep(reaction)
    }

    pub fn press(&mut self, button: &str) -> &Reaction {
        let reaction = self.engine.on_button_pressed(&mut self.session, button);
        self.keep(reaction)
    }

    pub fn say(&mut self, text: &str) -> &Reaction {
        let reaction = self.engine.on_chat_line(&mut self.session, text);
        self.keep(reaction)
    }

    pub fn guide(&mut self) -> &Reaction {
        let reaction = self.engine.on_guide_requested(&mut self.session);
        self.keep(reaction)
    }

    /// Type into the calculator and let the timer fire at once.
    pub fn calc(&mut self, input: &str) -> &Reaction {
        let started = self.engine.on_calculator_input(&mut self.session, input);
        let ready = started.effects.iter().find_map(|e| match e {
            Effect::Schedule {
                trigger: Trigger::CalculationReady(text),
                ..
            } => Some(text.clone()),
            _ => None,
        });
        self.log.push(started);
        match ready {
            Some(text) => {
                let reaction = self.engine.on_calculation_ready(&mut self.session, &text);
                self.keep(reaction)
            }
            None => self.log.last().unwrap(),
        }
    }

    /// Press a checkpoint button and confirm it.
    pub fn decide(&mut self, button: &str) -> &Reaction {
        self.press(button);
        self.say("1")
    }

    pub fn phase(&self) -> &str {
        self.session.phase()
    }

    /// Pick `journey` at the terminal.
    pub fn choose(&mut self, journey: u8) {
        self.enter("Adventurer Mode");
        self.say(&journey.to_string());
        assert_eq!(self.session.journey(), Some(JourneyId(journey)));
        assert_eq!(self.phase(), "terminal_journey_chosen");
    }

    /// TLB, calculator, and the hit-or-miss quiz.
    pub fn translate(&mut self) {
        self.enter("TLB Room");
        assert_eq!(self.phase(), "tlb_spawn");
        self.enter("Calculator Room");
        let va = self.session.var("va").to_string();
        self.calc(&va);
        self.say("A");
        assert_eq!(self.phase(), "calculator_solved_tlb");
        self.enter("TLB Room");
        let result = self.session.var("tlbResult").to_string();
        self.say(&result);
        assert_eq!(self.phase(), "tlb_after_calculator");
    }

    /// Page directory and the journey's own floor.
    pub fn walk_page_tables(&mut self) {
        self.enter("Page Table Library - Page Directory");
        assert_eq!(self.phase(), "page_directory");
        let floor = self.session.var("expectedFloor").to_string();
        self.enter(&format!("Page Table Library - Page Table {}", floor));
        assert_eq!(self.phase(), "correct_floor");
    }

    /// RAM button until the journey completes.
    pub fn finish_in_ram(&mut self) {
        self.press("ramMix");
        assert_eq!(self.phase(), "ram_finish");
        self.press("ramMix");
        assert_eq!(self.phase(), "journey_complete");
    }

    pub fn spoken(&self) -> Vec<String> {
        self.log
            .iter()
            .flat_map(|r| r.spoken().into_iter().map(str::to_string))
            .collect()
    }

    pub fn teleports(&self) -> Vec<String> {
        self.log
            .iter()
            .flat_map(|r| r.teleports().into_iter().map(str::to_string))
            .collect()
    }

    pub fn completions(&self) -> Vec<JourneyId> {
        self.log
            .iter()
            .flat_map(|r| r.effects.iter())
            .filter_map(|e| match e {
                Effect::MarkComplete { journey } => Some(*journey),
                _ => None,
            })
            .collect()
    }
}
