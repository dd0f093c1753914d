/// Journey integration tests: every shipped journey walked end to end
/// against the content directory.

mod common;

use common::{engine, Walk};
use oscity_engine::config::EngineConfig;
use oscity_engine::core::engine::ProgressionEngine;
use oscity_engine::schema::journey::JourneyId;

#[test]
fn lucky_goes_straight_from_tlb_to_permission_chamber() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.translate();
    assert!(walk.spoken().contains(&"rooms.tlb_room.hit_result".to_string()));

    walk.enter("Permission Chamber");
    assert_eq!(walk.phase(), "permission_decision");
    walk.decide("btn1");
    assert_eq!(walk.phase(), "ram_allow_access");

    let reaction = walk.press("perTerminate");
    assert_eq!(reaction.teleports(), vec!["ramRoom"]);
    let reaction = walk.enter("RAM Room");
    assert_eq!(
        reaction.spoken(),
        vec!["rooms.ram_room.at_spawn", "rooms.ram_room.allow_access"]
    );

    walk.finish_in_ram();
    assert_eq!(walk.completions(), vec![JourneyId(1)]);
    assert_eq!(walk.teleports().last().map(String::as_str), Some("endTerminal"));
    assert!(walk.session.progress.is_unlocked(JourneyId(2)));
}

#[test]
fn tlb_miss_walks_the_page_tables_and_retries() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 2);
    walk.choose(2);
    walk.translate();
    assert!(walk.spoken().contains(&"rooms.tlb_room.miss_result".to_string()));

    // A cached-translation shortcut is not open on a miss.
    walk.enter("Permission Chamber");
    assert_eq!(walk.phase(), "tlb_after_calculator");

    walk.walk_page_tables();
    assert_eq!(walk.session.var("floor"), "1");
    walk.enter("Permission Chamber");
    walk.decide("btn1");
    walk.enter("RAM Room");

    let reaction = walk.press("ramMix").clone();
    assert_eq!(reaction.spoken(), vec!["rooms.ram_room.retry_tlb_miss"]);
    assert_eq!(walk.phase(), "ram_retry_tlb_miss");
    assert_eq!(
        reaction.display("ramRoom.mixSign").map(|l| l[0].as_str()),
        Some("RETRY")
    );

    walk.finish_in_ram();
    assert_eq!(walk.completions(), vec![JourneyId(2)]);
}

#[test]
fn permission_violation_terminates_the_process() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 3);
    walk.choose(3);
    walk.translate();
    walk.walk_page_tables();
    assert_eq!(walk.session.var("floor"), "3");
    walk.enter("Permission Chamber");

    walk.decide("btn3");
    assert_eq!(walk.phase(), "segfault_end");
    let reaction = walk.press("perTerminate");
    assert_eq!(reaction.spoken(), vec!["rooms.permission_chamber.process_terminated"]);
    assert_eq!(walk.phase(), "segfault_finish");

    walk.press("perTerminate");
    assert_eq!(walk.phase(), "journey_complete");
    assert_eq!(walk.completions(), vec![JourneyId(3)]);
}

#[test]
fn swapped_out_page_comes_back_from_disk() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 4);
    walk.choose(4);
    walk.translate();
    walk.walk_page_tables();
    walk.enter("Permission Chamber");

    walk.decide("btn2");
    assert_eq!(walk.phase(), "page_fault_type");
    walk.decide("btn3");
    assert_eq!(walk.phase(), "disk_swap_retrieval");

    assert_eq!(walk.press("perTerminate").teleports(), vec!["diskRoom"]);
    let reaction = walk.enter("Disk Room");
    assert!(reaction
        .spoken()
        .contains(&"rooms.disk_room.swap_retrieval_prompt"));
    assert_eq!(walk.press("diskToRam").teleports(), vec!["ramRoom"]);
    let reaction = walk.enter("RAM Room");
    assert!(reaction.spoken().contains(&"rooms.ram_room.from_disk_swap_out"));

    walk.finish_in_ram();
    assert_eq!(walk.completions(), vec![JourneyId(4)]);
}

#[test]
fn pure_copy_on_write_uses_the_copied_frame() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 5);
    walk.choose(5);
    walk.translate();
    walk.walk_page_tables();
    walk.enter("Permission Chamber");

    walk.decide("btn4");
    assert_eq!(walk.phase(), "cow_decision");
    assert_eq!(walk.press("perTerminate").teleports(), vec!["cowRoom"]);
    walk.enter("COW Room");
    assert_eq!(walk.phase(), "cow_decision");

    walk.decide("allocateCow");
    assert_eq!(walk.phase(), "ram_after_cow");
    assert_eq!(walk.session.var("pfn"), "0x2");

    assert_eq!(walk.press("cowToRam").teleports(), vec!["ramRoom"]);
    let reaction = walk.enter("RAM Room");
    assert!(reaction.spoken().contains(&"rooms.ram_room.after_cow_pure"));
    walk.finish_in_ram();
    assert_eq!(walk.completions(), vec![JourneyId(5)]);
}

#[test]
fn lazy_loading_reads_the_file_and_evicts_a_frame() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 6);
    walk.choose(6);
    walk.translate();
    walk.walk_page_tables();
    assert_eq!(walk.session.var("floor"), "2");
    walk.enter("Permission Chamber");

    walk.decide("btn2");
    walk.decide("btn2");
    assert_eq!(walk.phase(), "lazy_loading_entered");
    assert_eq!(walk.press("perTerminate").teleports(), vec!["pageFaultCorridor"]);
    walk.enter("Page Fault Corridor");
    assert_eq!(walk.phase(), "page_fault_corridor");
    walk.enter("Lazy Loading Room");
    assert_eq!(walk.phase(), "lazy_loading_entered");

    // Second calculator visit asks for the page index instead.
    assert_eq!(walk.press("loadingTp").teleports(), vec!["calculatorRoom"]);
    walk.enter("Calculator Room");
    assert_eq!(walk.phase(), "calculator_from_lazy_loading");
    walk.calc("0x8E");
    assert!(walk.session.pending().is_some());
    walk.say("A");
    assert_eq!(walk.phase(), "calculator_solved_lazy_loading");

    walk.enter("Lazy Loading Room");
    assert_eq!(walk.phase(), "lazy_loading_returned");
    assert_eq!(walk.press("loadingTp").teleports(), vec!["diskRoom"]);
    walk.enter("Disk Room");
    assert_eq!(walk.phase(), "disk_lazy_loading");
    walk.press("diskToRam");
    let reaction = walk.enter("RAM Room");
    assert!(reaction.spoken().contains(&"rooms.ram_room.ram_full_need_swap"));
    assert_eq!(walk.press("ramMix").teleports(), vec!["swapDistrict"]);

    walk.enter("Swap District");
    assert_eq!(walk.phase(), "swap_entered");
    assert_eq!(walk.session.var("slot"), "1");
    assert_eq!(walk.session.clock().map(|c| c.victim()), Some(5));

    let reaction = walk.press("swapLever");
    assert_eq!(reaction.spoken(), vec!["rooms.swap_district.lever_locked"]);
    assert_eq!(walk.phase(), "swap_entered");

    for frame in 1..=6 {
        walk.press(&format!("frame{}btn", frame));
    }
    walk.press("frame1btn");
    assert_eq!(walk.phase(), "swap_entered");
    walk.press("frame5btn");
    assert_eq!(walk.phase(), "swap_victim_found");
    assert_eq!(walk.session.var("victim"), "5");

    walk.press("swapLever");
    assert_eq!(walk.phase(), "swap_evicted");
    assert!(walk.session.clock().is_none());

    let reaction = walk.enter("RAM Room");
    assert!(reaction
        .spoken()
        .contains(&"rooms.ram_room.after_swap_for_lazy_loading"));
    assert_eq!(walk.phase(), "swap_lazy_loading");
    walk.finish_in_ram();
    assert_eq!(walk.completions(), vec![JourneyId(6)]);
}

#[test]
fn lazy_allocation_allocates_then_copies_on_write() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 7);
    walk.choose(7);
    walk.translate();
    walk.walk_page_tables();
    walk.enter("Permission Chamber");

    walk.decide("btn2");
    walk.decide("btn1");
    assert_eq!(walk.phase(), "lazy_alloc_decision");
    walk.press("perTerminate");
    walk.enter("Page Fault Corridor");
    walk.enter("Lazy Allocation Room");
    assert_eq!(walk.phase(), "lazy_alloc_decision");

    walk.decide("allocateLazy");
    assert_eq!(walk.phase(), "ram_after_lazy_alloc");
    assert_eq!(walk.press("btnLazyAlloc").teleports(), vec!["ramRoom"]);
    walk.enter("RAM Room");
    walk.press("ramMix");
    assert_eq!(walk.phase(), "ram_continue_to_lazy_alloc");
    assert_eq!(walk.press("ramMix").teleports(), vec!["lazyAllocationRoom"]);

    // The second visit turns the read into a write.
    walk.enter("Lazy Allocation Room");
    assert_eq!(walk.phase(), "lazy_alloc_cow");
    assert_eq!(walk.session.var("operation"), "write");
    assert_eq!(walk.session.var("instruction"), "write 0x45 hello");

    walk.decide("cowLazyAlloc");
    assert_eq!(walk.phase(), "going_to_cow");
    assert_eq!(walk.press("btnLazyAlloc").teleports(), vec!["cowRoom"]);
    walk.enter("COW Room");
    walk.decide("allocateCow");
    assert_eq!(walk.session.var("pfn"), "0x6");
    walk.press("cowToRam");
    let reaction = walk.enter("RAM Room");
    assert!(reaction.spoken().contains(&"rooms.ram_room.ram_full_need_swap"));
    assert_eq!(walk.press("ramMix").teleports(), vec!["swapDistrict"]);

    walk.enter("Swap District");
    assert_eq!(walk.session.var("slot"), "0");
    assert_eq!(walk.session.clock().map(|c| c.victim()), Some(6));
    for frame in 1..=6 {
        walk.press(&format!("frame{}btn", frame));
    }
    walk.press("frame6btn");
    walk.press("swapLever");

    let reaction = walk.enter("RAM Room");
    assert!(reaction
        .spoken()
        .contains(&"rooms.ram_room.after_swap_for_lazy_alloc"));
    walk.finish_in_ram();
    assert_eq!(walk.completions(), vec![JourneyId(7)]);
    assert!(walk.session.progress.all_complete(engine.catalog()));
}

#[test]
fn wrong_floor_sends_the_player_back_to_the_directory() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 2);
    walk.choose(2);
    walk.translate();
    walk.enter("Page Table Library - Page Directory");

    walk.enter("Page Table Library - Page Table 3");
    assert_eq!(walk.phase(), "wrong_floor");
    walk.enter("Permission Chamber");
    assert_eq!(walk.phase(), "wrong_floor");

    walk.enter("Page Table Library - Page Directory");
    walk.enter("Page Table Library - Page Table 1");
    assert_eq!(walk.phase(), "correct_floor");
}

#[test]
fn wrong_permission_answer_keeps_the_decision_open() {
    let engine = engine();
    let mut walk = Walk::new(&engine, 1);
    walk.choose(1);
    walk.translate();
    walk.enter("Permission Chamber");

    let reaction = walk.decide("btn3").clone();
    assert_eq!(reaction.spoken(), vec!["feedback.permission_wrong.segfault"]);
    assert_eq!(walk.phase(), "permission_decision");
    assert_eq!(walk.session.summary().wrong_answers, 1);

    walk.decide("btn1");
    assert_eq!(walk.phase(), "ram_allow_access");
}

#[test]
fn other_offset_widths_still_reach_the_right_floor() {
    for bits in [3, 5] {
        let config = EngineConfig {
            page_offset_bits: bits,
            seed: 42,
            ..EngineConfig::default()
        };
        let engine = ProgressionEngine::builder()
            .content_dir("content")
            .config(config)
            .build()
            .unwrap();
        let mut walk = Walk::new(&engine, 2);
        walk.choose(2);
        assert_eq!(walk.session.var("expectedFloor"), "1", "bits={}", bits);

        walk.translate();
        walk.walk_page_tables();
        walk.enter("Permission Chamber");
        walk.decide("btn1");
        walk.enter("RAM Room");
        walk.press("ramMix");
        walk.finish_in_ram();
        assert_eq!(walk.completions(), vec![JourneyId(2)], "bits={}", bits);
    }
}
