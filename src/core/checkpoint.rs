/// Decision checkpoints: rooms where the player commits to one of several
/// labelled buttons and the choice is checked against the journey.

use tracing::warn;

use super::engine::Turn;
use super::phase;
use super::prompt::{self, PendingConfirmation};
use crate::schema::journey::{FaultSubtype, Journey, PermissionAnswer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    Permission,
    FaultType,
    LazyAllocFirst,
    LazyAllocWrite,
    CopyOnWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    Permission(PermissionAnswer),
    Fault(FaultSubtype),
    Allocate,
    SwapFromDisk,
    CopyOnWrite,
    DenyWrite,
    DoNothing,
    AllocateAndCopy,
    Terminate,
}

/// One labelled button at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionButton {
    pub button: &'static str,
    pub label: &'static str,
    pub choice: Choice,
}

const fn decision(button: &'static str, label: &'static str, choice: Choice) -> DecisionButton {
    DecisionButton {
        button,
        label,
        choice,
    }
}

static PERMISSION_BUTTONS: [DecisionButton; 4] = [
    decision("btn1", "Allow Access", Choice::Permission(PermissionAnswer::AllowAccess)),
    decision("btn2", "Page Fault", Choice::Permission(PermissionAnswer::PageFault)),
    decision("btn3", "Segmentation Fault", Choice::Permission(PermissionAnswer::Segfault)),
    decision("btn4", "Permission Fault", Choice::Permission(PermissionAnswer::ProtectionFault)),
];

static FAULT_TYPE_BUTTONS: [DecisionButton; 3] = [
    decision("btn1", "Lazy Allocation", Choice::Fault(FaultSubtype::LazyAllocation)),
    decision("btn2", "Lazy Loading", Choice::Fault(FaultSubtype::LazyLoading)),
    decision("btn3", "Swapping", Choice::Fault(FaultSubtype::SwappedOut)),
];

static LAZY_ALLOC_FIRST_BUTTONS: [DecisionButton; 2] = [
    decision("allocateLazy", "ALLOCATE", Choice::Allocate),
    decision("swapLazy", "SWAP FROM DISK", Choice::SwapFromDisk),
];

static LAZY_ALLOC_WRITE_BUTTONS: [DecisionButton; 3] = [
    decision("cowLazyAlloc", "COW (COPY-ON-WRITE)", Choice::CopyOnWrite),
    decision("btnLazyAlloc", "DENY THE WRITE", Choice::DenyWrite),
    decision("nothing", "DO NOTHING", Choice::DoNothing),
];

static COPY_ON_WRITE_BUTTONS: [DecisionButton; 2] = [
    decision("allocateCow", "ALLOCATE & COPY", Choice::AllocateAndCopy),
    decision("terminate", "TERMINATE PROCESS", Choice::Terminate),
];

pub const PERMISSION_SIGNS: [&str; 6] = [
    "perChamber.sign1",
    "perChamber.sign2",
    "perChamber.sign3",
    "perChamber.sign4",
    "perChamber.sign5",
    "perChamber.sign6",
];

impl Checkpoint {
    pub const ALL: [Checkpoint; 5] = [
        Checkpoint::Permission,
        Checkpoint::FaultType,
        Checkpoint::LazyAllocFirst,
        Checkpoint::LazyAllocWrite,
        Checkpoint::CopyOnWrite,
    ];

    pub fn for_phase(phase: &str) -> Option<Checkpoint> {
        Self::ALL.into_iter().find(|c| c.phase() == phase)
    }

    /// The phase in which this checkpoint's buttons are live.
    pub fn phase(self) -> &'static str {
        match self {
            Checkpoint::Permission => phase::PERMISSION_DECISION,
            Checkpoint::FaultType => phase::PAGE_FAULT_TYPE,
            Checkpoint::LazyAllocFirst => phase::LAZY_ALLOC_DECISION,
            Checkpoint::LazyAllocWrite => phase::LAZY_ALLOC_COW,
            Checkpoint::CopyOnWrite => phase::COW_DECISION,
        }
    }

    pub fn buttons(self) -> &'static [DecisionButton] {
        match self {
            Checkpoint::Permission => &PERMISSION_BUTTONS,
            Checkpoint::FaultType => &FAULT_TYPE_BUTTONS,
            Checkpoint::LazyAllocFirst => &LAZY_ALLOC_FIRST_BUTTONS,
            Checkpoint::LazyAllocWrite => &LAZY_ALLOC_WRITE_BUTTONS,
            Checkpoint::CopyOnWrite => &COPY_ON_WRITE_BUTTONS,
        }
    }

    pub fn button(self, id: &str) -> Option<&'static DecisionButton> {
        self.buttons().iter().find(|b| b.button == id)
    }

    /// Spoken right after a button press, with `{button}` set to its label.
    pub fn ack_dialogue(self) -> &'static str {
        match self {
            Checkpoint::Permission | Checkpoint::FaultType => {
                "rooms.permission_chamber.after_button_press"
            }
            Checkpoint::LazyAllocFirst | Checkpoint::LazyAllocWrite => {
                "rooms.lazy_allocation_room.after_button_press"
            }
            Checkpoint::CopyOnWrite => "rooms.cow_room.after_button_press",
        }
    }

    /// Context tag for missed answers.
    pub fn miss_context(self) -> &'static str {
        match self {
            Checkpoint::Permission => "permission_chamber",
            Checkpoint::FaultType => "permission_chamber_pft",
            Checkpoint::LazyAllocFirst => "lazy_allocation_room",
            Checkpoint::LazyAllocWrite => "lazy_allocation_room_write",
            Checkpoint::CopyOnWrite => "cow_room",
        }
    }

    pub fn is_correct(self, choice: Choice, journey: &Journey) -> bool {
        match (self, choice) {
            (Checkpoint::Permission, Choice::Permission(answer)) => answer == journey.primary_answer,
            (Checkpoint::FaultType, Choice::Fault(subtype)) => Some(subtype) == journey.fault_subtype,
            (Checkpoint::LazyAllocFirst, Choice::Allocate) => true,
            (Checkpoint::LazyAllocWrite, Choice::CopyOnWrite) => true,
            (Checkpoint::CopyOnWrite, Choice::AllocateAndCopy) => true,
            _ => false,
        }
    }

    /// Hint spoken when `choice` is confirmed but wrong.
    pub fn wrong_dialogue(self, choice: Choice) -> String {
        match (self, choice) {
            (Checkpoint::Permission, Choice::Permission(answer)) => {
                format!("feedback.permission_wrong.{}", answer.key())
            }
            (Checkpoint::FaultType, Choice::Fault(subtype)) => {
                format!("feedback.fault_type_wrong.{}", subtype.key())
            }
            (Checkpoint::LazyAllocFirst, _) => "rooms.lazy_allocation_room.allocate_incorrect".to_string(),
            (Checkpoint::LazyAllocWrite, _) => {
                "rooms.lazy_allocation_room.second_visit_incorrect".to_string()
            }
            (Checkpoint::CopyOnWrite, _) => "rooms.cow_room.terminate_incorrect".to_string(),
            _ => "feedback.generic_wrong".to_string(),
        }
    }
}

/// A decision button was pressed: acknowledge it and ask for confirmation.
pub(crate) fn press(turn: &mut Turn<'_>, checkpoint: Checkpoint, decision: &DecisionButton) {
    if turn.journey().is_none() {
        warn!(button = decision.button, "decision button pressed without a journey");
        return;
    }
    turn.set_var("button", decision.label);
    turn.speak(checkpoint.ack_dialogue());
    let raised_in = turn.phase().to_string();
    prompt::pose_confirmation(
        turn,
        PendingConfirmation {
            checkpoint,
            button: decision.button.to_string(),
            choice: decision.choice,
            raised_in,
        },
    );
}

/// The player confirmed `choice`.
pub(crate) fn resolve(turn: &mut Turn<'_>, checkpoint: Checkpoint, choice: Choice) {
    let Some(journey) = turn.journey() else {
        warn!(?checkpoint, "confirmation resolved without a journey");
        return;
    };

    if !checkpoint.is_correct(choice, journey) {
        turn.log_miss(checkpoint.miss_context());
        let hint = checkpoint.wrong_dialogue(choice);
        turn.speak(&hint);
        return;
    }

    match choice {
        Choice::Permission(answer) => resolve_permission(turn, answer),
        Choice::Fault(subtype) => resolve_fault_type(turn, subtype),
        Choice::Allocate => {
            turn.speak("rooms.lazy_allocation_room.allocate_correct");
            turn.set_phase(phase::RAM_AFTER_LAZY_ALLOC);
            turn.sign("lazyAllocation.allocateSign", "");
            turn.sign("lazyAllocation.swapSign", "");
            turn.sign("lazyAllocation.mixSign", "Go to RAM");
        }
        Choice::CopyOnWrite => {
            turn.speak("rooms.lazy_allocation_room.second_visit_correct");
            turn.set_phase(phase::GOING_TO_COW);
            turn.sign("lazyAllocation.cowSign", "");
            turn.sign("lazyAllocation.doNothingSign", "");
            turn.sign("lazyAllocation.writeSign", "");
            turn.sign("lazyAllocation.mixSign", "Go to COW/room");
        }
        Choice::AllocateAndCopy => {
            let pfn_cow = turn.var("pfnCow").to_string();
            if pfn_cow != "?" {
                turn.set_var("pfn", pfn_cow);
            }
            turn.speak("rooms.cow_room.allocate_copy_correct");
            turn.set_phase(phase::RAM_AFTER_COW);
            turn.sign("cowRoom.toRamSign", "Go to RAM");
        }
        Choice::SwapFromDisk | Choice::DenyWrite | Choice::DoNothing | Choice::Terminate => {}
    }
}

fn resolve_permission(turn: &mut Turn<'_>, answer: PermissionAnswer) {
    let sign6 = PERMISSION_SIGNS[5];
    match answer {
        PermissionAnswer::AllowAccess => {
            turn.speak("feedback.allow_access_correct");
            turn.set_phase(phase::RAM_ALLOW_ACCESS);
            turn.sign(sign6, "Go to RAM");
        }
        PermissionAnswer::PageFault => {
            turn.speak("feedback.page_fault_correct");
            turn.set_phase(phase::PAGE_FAULT_TYPE);
            let labels = [
                FaultSubtype::LazyAllocation.label(),
                FaultSubtype::LazyLoading.label(),
                FaultSubtype::SwappedOut.label(),
                "",
                "Which type of/page fault?",
            ];
            for (sign, text) in PERMISSION_SIGNS.iter().zip(labels) {
                turn.sign(sign, text);
            }
            turn.speak("rooms.permission_chamber.page_fault_subtype_prompt");
        }
        PermissionAnswer::Segfault => {
            turn.speak("feedback.segfault_correct");
            turn.set_phase(phase::SEGFAULT_END);
            turn.sign(sign6, "Terminate/process and/finish");
        }
        PermissionAnswer::ProtectionFault => {
            turn.speak("feedback.protection_fault_correct");
            turn.set_phase(phase::COW_DECISION);
            turn.sign(sign6, "Go to COW/room");
        }
    }
}

fn resolve_fault_type(turn: &mut Turn<'_>, subtype: FaultSubtype) {
    let sign6 = PERMISSION_SIGNS[5];
    match subtype {
        FaultSubtype::LazyAllocation => {
            turn.speak("feedback.lazy_allocation_correct");
            turn.speak("feedback.proceed_to_corridor");
            turn.set_phase(phase::LAZY_ALLOC_DECISION);
            turn.sign(sign6, "Go to Page/Fault Corridor");
        }
        FaultSubtype::LazyLoading => {
            turn.speak("feedback.lazy_loading_correct");
            turn.speak("feedback.proceed_to_corridor");
            turn.set_phase(phase::LAZY_LOADING_ENTERED);
            turn.sign(sign6, "Go to Page/Fault Corridor");
        }
        FaultSubtype::SwappedOut => {
            turn.speak("feedback.swapped_out_correct");
            turn.speak("feedback.proceed_to_disk");
            turn.set_phase(phase::DISK_SWAP_RETRIEVAL);
            turn.sign(sign6, "Go to Disk");
        }
    }
}

/// Every dialogue path the checkpoints can speak.
pub(crate) fn dialogue_paths() -> Vec<String> {
    let mut paths: Vec<String> = [
        "rooms.permission_chamber.after_button_press",
        "rooms.permission_chamber.page_fault_subtype_prompt",
        "rooms.lazy_allocation_room.after_button_press",
        "rooms.lazy_allocation_room.allocate_correct",
        "rooms.lazy_allocation_room.second_visit_correct",
        "rooms.cow_room.after_button_press",
        "rooms.cow_room.allocate_copy_correct",
        "feedback.allow_access_correct",
        "feedback.page_fault_correct",
        "feedback.segfault_correct",
        "feedback.protection_fault_correct",
        "feedback.lazy_allocation_correct",
        "feedback.lazy_loading_correct",
        "feedback.swapped_out_correct",
        "feedback.proceed_to_corridor",
        "feedback.proceed_to_disk",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect();
    for checkpoint in Checkpoint::ALL {
        for decision in checkpoint.buttons() {
            if !matches!(
                (checkpoint, decision.choice),
                (Checkpoint::LazyAllocFirst, Choice::Allocate)
                    | (Checkpoint::LazyAllocWrite, Choice::CopyOnWrite)
                    | (Checkpoint::CopyOnWrite, Choice::AllocateAndCopy)
            ) {
                paths.push(checkpoint.wrong_dialogue(decision.choice));
            }
        }
    }
    paths.sort();
    paths.dedup();
    paths
}
