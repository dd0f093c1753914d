/// Phase tags and the vocabulary they are checked against.
///
/// Phases stay plain strings so content can introduce new ones. The engine
/// declares the set it knows about and refuses to build if a transition
/// table names a phase outside it.

use rustc_hash::FxHashSet;

pub const TERMINAL_SPAWN: &str = "terminal_spawn";
pub const ADVENTURER_SELECT: &str = "adventurer_select";
pub const TERMINAL_JOURNEY_CHOSEN: &str = "terminal_journey_chosen";
pub const JOURNEY_COMPLETE: &str = "journey_complete";

pub const TLB_SPAWN: &str = "tlb_spawn";
pub const TLB_LOOKUP: &str = "tlb_lookup";
pub const TLB_AFTER_CALCULATOR: &str = "tlb_after_calculator";

pub const CALCULATOR_FROM_TLB: &str = "calculator_from_tlb";
pub const CALCULATOR_SOLVED_TLB: &str = "calculator_solved_tlb";
pub const CALCULATOR_FROM_LAZY_LOADING: &str = "calculator_from_lazy_loading";
pub const CALCULATOR_SOLVED_LAZY_LOADING: &str = "calculator_solved_lazy_loading";

pub const PAGE_DIRECTORY: &str = "page_directory";
pub const CORRECT_FLOOR: &str = "correct_floor";
pub const WRONG_FLOOR: &str = "wrong_floor";

pub const PERMISSION_DECISION: &str = "permission_decision";
pub const PAGE_FAULT_TYPE: &str = "page_fault_type";
pub const SEGFAULT_END: &str = "segfault_end";
pub const SEGFAULT_FINISH: &str = "segfault_finish";

pub const RAM_ALLOW_ACCESS: &str = "ram_allow_access";
pub const RAM_RETRY_TLB_MISS: &str = "ram_retry_tlb_miss";
pub const RAM_FINISH: &str = "ram_finish";

pub const COW_DECISION: &str = "cow_decision";
pub const RAM_AFTER_COW: &str = "ram_after_cow";

pub const PAGE_FAULT_CORRIDOR: &str = "page_fault_corridor";
pub const LAZY_ALLOC_DECISION: &str = "lazy_alloc_decision";
pub const RAM_AFTER_LAZY_ALLOC: &str = "ram_after_lazy_alloc";
pub const RAM_CONTINUE_TO_LAZY_ALLOC: &str = "ram_continue_to_lazy_alloc";
pub const LAZY_ALLOC_COW: &str = "lazy_alloc_cow";
pub const GOING_TO_COW: &str = "going_to_cow";

pub const LAZY_LOADING_ENTERED: &str = "lazy_loading_entered";
pub const LAZY_LOADING_RETURNED: &str = "lazy_loading_returned";
pub const DISK_LAZY_LOADING: &str = "disk_lazy_loading";
pub const DISK_SWAP_RETRIEVAL: &str = "disk_swap_retrieval";

pub const SWAP_ENTERED: &str = "swap_entered";
pub const SWAP_VICTIM_FOUND: &str = "swap_victim_found";
pub const SWAP_EVICTED: &str = "swap_evicted";
pub const SWAP_LAZY_LOADING: &str = "swap_lazy_loading";
pub const SWAP_LAZY_ALLOC: &str = "swap_lazy_alloc";

/// Every phase the built-in tables use.
pub const BUILT_IN: &[&str] = &[
    TERMINAL_SPAWN,
    ADVENTURER_SELECT,
    TERMINAL_JOURNEY_CHOSEN,
    JOURNEY_COMPLETE,
    TLB_SPAWN,
    TLB_LOOKUP,
    TLB_AFTER_CALCULATOR,
    CALCULATOR_FROM_TLB,
    CALCULATOR_SOLVED_TLB,
    CALCULATOR_FROM_LAZY_LOADING,
    CALCULATOR_SOLVED_LAZY_LOADING,
    PAGE_DIRECTORY,
    CORRECT_FLOOR,
    WRONG_FLOOR,
    PERMISSION_DECISION,
    PAGE_FAULT_TYPE,
    SEGFAULT_END,
    SEGFAULT_FINISH,
    RAM_ALLOW_ACCESS,
    RAM_RETRY_TLB_MISS,
    RAM_FINISH,
    COW_DECISION,
    RAM_AFTER_COW,
    PAGE_FAULT_CORRIDOR,
    LAZY_ALLOC_DECISION,
    RAM_AFTER_LAZY_ALLOC,
    RAM_CONTINUE_TO_LAZY_ALLOC,
    LAZY_ALLOC_COW,
    GOING_TO_COW,
    LAZY_LOADING_ENTERED,
    LAZY_LOADING_RETURNED,
    DISK_LAZY_LOADING,
    DISK_SWAP_RETRIEVAL,
    SWAP_ENTERED,
    SWAP_VICTIM_FOUND,
    SWAP_EVICTED,
    SWAP_LAZY_LOADING,
    SWAP_LAZY_ALLOC,
];

/// The set of phases the running engine accepts.
#[derive(Debug, Clone)]
pub struct PhaseVocabulary {
    declared: FxHashSet<String>,
}

impl Default for PhaseVocabulary {
    fn default() -> Self {
        Self {
            declared: BUILT_IN.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PhaseVocabulary {
    pub fn declare(&mut self, phase: &str) {
        self.declared.insert(phase.to_string());
    }

    pub fn is_declared(&self, phase: &str) -> bool {
        self.declared.contains(phase)
    }

    /// First phase in `phases` that is not declared.
    pub fn first_undeclared<'a>(
        &self,
        phases: impl IntoIterator<Item = &'a str>,
    ) -> Option<&'a str> {
        phases.into_iter().find(|p| !self.is_declared(p))
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
