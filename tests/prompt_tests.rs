/// Prompt integration tests: journey selection, confirmations, quizzes and
/// the guide's help menu.

mod common;

use common::{engine, Walk};
use oscity_engine::config::EngineConfig;
use oscity_engine::core::content::{DialogueBook, Question, QuestionBank};
use oscity_engine::core::engine::ProgressionEngine;
use oscity_engine::core::guide;
use oscity_engine::core::prompt::{PendingKind, CANCELLED};
use oscity_engine::core::selection::{NOT_A_NUMBER, OUT_OF_RANGE};
use oscity_engine::schema::journey::JourneyId;
use oscity_engine::schema::region::WorldLayout;
use std::path::Path;

/// The shipped dialogue and world with only the given questions.
fn engine_with_questions(questions: QuestionBank) -> ProgressionEngine {
    let dialogue = DialogueBook::load_from_ron(Path::new("content/dialogue.ron")).unwrap();
    let world = WorldLayout::load_from_ron(Path::new("content/world.ron")).unwrap();
    ProgressionEngine::builder()
        .with_dialogue(dialogue)
        .with_questions(questions)
        .with_world(world)
        .config(EngineConfig {
            seed: 42,
            ..EngineConfig::default()
        })
        .build()
        .unwrap()
}

fn confirm_only() -> QuestionBank {
    let mut questions = QuestionBank::default();
    questions.insert(
        "general.confirm_choice",
        Question::new("Are you sure?", "1")
            .with_option("1", "YES")
            .with_option("2", "NO"),
    );
    questions
}

#[test]
fn locked_journeys_cannot_be_chosen() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.enter("Adventurer Mode");

    let reaction = walk.say("3").clone();
    assert!(reaction.consumed);
    assert!(reaction.lines().iter().any(|l| l.contains("Journey 3 is locked")));
    assert!(reaction.lines().iter().any(|l| l.contains("TLB Miss - No Fault")));
    assert_eq!(walk.phase(), "adventurer_select");
    assert_eq!(walk.session.journey(), None);

    assert_eq!(walk.say("9").lines(), vec![OUT_OF_RANGE]);
    assert_eq!(walk.say("first one").lines(), vec![NOT_A_NUMBER]);
    assert_eq!(walk.phase(), "adventurer_select");
}

#[test]
fn journey_list_marks_progress() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 3);
    let reaction = walk.enter("Adventurer Mode").clone();
    let lines = reaction.lines();
    assert!(lines.contains(&"  1. [✓] Lucky"));
    assert!(lines.contains(&"  3. [→] Permission Violation"));
    assert!(lines.contains(&"  4. [🔒] Swapped-Out Page"));
}

#[test]
fn random_choice_only_picks_unlocked_journeys() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.enter("Adventurer Mode");
    let reaction = walk.say("8").clone();
    assert_eq!(reaction.spoken(), vec!["rooms.terminal.journey_random"]);
    assert_eq!(walk.session.journey(), Some(JourneyId(1)));
    assert_eq!(walk.session.var("va"), "0x2A");
}

#[test]
fn chat_after_selection_is_not_swallowed() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    let reaction = walk.say("2").clone();
    assert!(!reaction.consumed);
    assert_eq!(walk.session.journey(), Some(JourneyId(1)));
}

#[test]
fn confirmation_can_be_cancelled_and_retried() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.translate();
    walk.enter("Permission Chamber");

    let reaction = walk.press("btn1").clone();
    assert_eq!(
        reaction.spoken(),
        vec!["rooms.permission_chamber.after_button_press"]
    );
    assert!(reaction.lines().contains(&"You chose: Allow Access."));
    assert!(reaction.lines().contains(&"1) YES"));

    let reaction = walk.say("maybe").clone();
    assert!(reaction.consumed);
    assert!(reaction.lines().contains(&"Please type 1 (YES) or 2 (NO)."));
    assert_eq!(
        walk.session.pending().map(|p| p.kind()),
        Some(PendingKind::Confirmation)
    );

    assert_eq!(walk.say("2").lines(), vec![CANCELLED]);
    assert!(walk.session.pending().is_none());
    assert_eq!(walk.phase(), "permission_decision");

    walk.decide("btn1");
    assert_eq!(walk.phase(), "ram_allow_access");
}

#[test]
fn pressing_another_button_replaces_the_confirmation() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.translate();
    walk.enter("Permission Chamber");

    walk.press("btn3");
    walk.press("btn1");
    walk.say("1");
    assert_eq!(walk.phase(), "ram_allow_access");
    assert_eq!(walk.session.summary().wrong_answers, 0);
}

#[test]
fn wrong_quiz_answer_repeats_the_question() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");
    walk.calc("0x2A");

    let reaction = walk.say("B").clone();
    assert!(reaction.lines().contains(&"Which is 0x2A in binary?"));
    assert_eq!(walk.phase(), "calculator_from_tlb");
    assert_eq!(walk.session.summary().wrong_answers, 1);

    walk.say(" a ");
    assert_eq!(walk.phase(), "calculator_solved_tlb");
}

#[test]
fn calculator_shows_the_split() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");

    let started = engine.on_calculator_input(&mut walk.session, "42");
    assert!(started.lines().iter().any(|l| l.contains("Processing")));
    assert!(walk.session.is_calculating());

    // A second input while working is ignored.
    let ignored = engine.on_calculator_input(&mut walk.session, "43");
    assert!(ignored.effects.is_empty());

    let ready = engine.on_calculation_ready(&mut walk.session, "42");
    assert!(!walk.session.is_calculating());
    let binary = ready.display("calculatorRoom.calculationFrame1").unwrap();
    assert_eq!(binary[1], "0010 1010");
    let split = ready.display("calculatorRoom.calculationFrame6").unwrap();
    assert_eq!(split[1], "0x2");
    assert_eq!(split[2], "0xA");
}

#[test]
fn calculator_rejects_garbage() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");

    let reaction = walk.calc("banana").clone();
    assert!(reaction.lines().iter().any(|l| l.ends_with("HELP")));
    assert!(walk.session.pending().is_none());
    assert_eq!(walk.phase(), "calculator_from_tlb");
}

#[test]
fn skip_button_solves_the_journey_address() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");

    let reaction = walk.press("skipCalc").clone();
    let binary = reaction.display("calculatorRoom.calculationFrame1").unwrap();
    assert_eq!(binary[1], "0010 1010");
    assert_eq!(
        walk.session.pending().map(|p| p.kind()),
        Some(PendingKind::Quiz)
    );
}

#[test]
fn decisions_wait_for_the_quiz() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.translate();
    walk.enter("Permission Chamber");
    walk.press("btn1");

    // The guide does not open over a confirmation.
    let reaction = walk.guide().clone();
    assert!(reaction.lines().contains(&guide::BUSY));
    assert_eq!(
        walk.session.pending().map(|p| p.kind()),
        Some(PendingKind::Confirmation)
    );
}

#[test]
fn guide_menu_gives_hints_and_concepts() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");

    let menu = walk.guide().clone();
    assert_eq!(menu.lines(), guide::MENU.to_vec());
    assert_eq!(walk.say("4").lines(), vec![guide::MENU_RETRY]);

    let hint = walk.say("2").clone();
    assert_eq!(hint.spoken(), vec!["hints.tlb_room.before_calculator"]);
    assert_eq!(walk.session.summary().hints_used, 1);
    assert!(walk.session.pending().is_none());

    walk.guide();
    let replay = walk.say("1").clone();
    assert_eq!(replay.spoken(), vec!["rooms.tlb_room.at_spawn"]);

    walk.guide();
    let concepts = walk.say("3").clone();
    assert!(concepts.lines().contains(&"  1. TLB Hit"));
    let explained = walk.say("2").clone();
    assert_eq!(
        explained.lines(),
        vec!["A TLB miss means the translation has to be read from the page tables."]
    );
    assert!(walk.session.pending().is_none());
}

#[test]
fn terminal_resets_an_abandoned_journey_prompt() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");
    walk.calc("0x2A");
    assert!(walk.session.pending().is_some());

    walk.enter("Terminal");
    assert_eq!(walk.phase(), "terminal_spawn");
    assert!(walk.session.pending().is_none());
    assert!(!walk.session.is_calculating());
}

#[test]
fn missing_calculator_question_does_not_solve_the_step() {
    let engine = engine_with_questions(confirm_only());
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");
    walk.calc("0x2A");

    assert!(walk.session.pending().is_none());
    assert_eq!(walk.phase(), "calculator_from_tlb");
    assert!(!walk.say("A").consumed);
    assert_eq!(walk.phase(), "calculator_from_tlb");
}

#[test]
fn missing_tlb_question_gives_no_free_answer() {
    let mut questions = confirm_only();
    questions.insert(
        "calculator_room.binary_split",
        Question::new("Which is {hex} in binary?", "A")
            .with_option("A", "{optA}")
            .with_option("B", "{optB}")
            .with_option("C", "{optC}"),
    );
    let engine = engine_with_questions(questions);
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.enter("TLB Room");
    walk.enter("Calculator Room");
    walk.calc("0x2A");
    walk.say("A");
    assert_eq!(walk.phase(), "calculator_solved_tlb");

    walk.enter("TLB Room");
    assert!(walk.session.pending().is_none());
    assert_eq!(walk.phase(), "tlb_lookup");

    let reaction = walk.say("hit").clone();
    assert!(!reaction.consumed);
    assert_eq!(walk.phase(), "tlb_lookup");
    assert!(!walk.spoken().contains(&"rooms.tlb_room.hit_result".to_string()));
}
