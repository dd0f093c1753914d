/// The seven scripted journeys and the parameters each one feeds into the
/// shared dialogue.

use serde::{Deserialize, Serialize};

use super::address::{format_hex, format_nibbles, AddressLayout, AddressSplit};
use crate::core::phase;
use super::player::Vars;

/// Journey number. Also the unlock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JourneyId(pub u8);

impl JourneyId {
    pub const FIRST: JourneyId = JourneyId(1);

    pub fn previous(self) -> Option<JourneyId> {
        (self.0 > 1).then(|| JourneyId(self.0 - 1))
    }
}

/// Expected choice at the permission chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAnswer {
    AllowAccess,
    PageFault,
    Segfault,
    ProtectionFault,
}

impl PermissionAnswer {
    pub fn key(self) -> &'static str {
        match self {
            Self::AllowAccess => "allow_access",
            Self::PageFault => "page_fault",
            Self::Segfault => "segfault",
            Self::ProtectionFault => "protection_fault",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AllowAccess => "Allow Access",
            Self::PageFault => "Page Fault",
            Self::Segfault => "Segmentation Fault",
            Self::ProtectionFault => "Permission Fault",
        }
    }
}

/// Expected choice at the page fault subtype checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultSubtype {
    LazyAllocation,
    LazyLoading,
    SwappedOut,
}

impl FaultSubtype {
    pub fn key(self) -> &'static str {
        match self {
            Self::LazyAllocation => "lazy_allocation",
            Self::LazyLoading => "lazy_loading",
            Self::SwappedOut => "swapped_out",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LazyAllocation => "Lazy Allocation",
            Self::LazyLoading => "Lazy Loading",
            Self::SwappedOut => "Swapping",
        }
    }
}

/// Journey-specific literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub virtual_address: u64,
    pub operation: &'static str,
    pub instruction: &'static str,
    pub pfn: &'static str,
    pub pfn_cow: Option<&'static str>,
    /// Page table floor that holds the translation. `None` when the TLB
    /// already has it.
    pub expected_floor: Option<u8>,
    /// Wrong options for the binary split quiz; option A is always the
    /// correct binary form.
    pub distractors: [&'static str; 2],
    /// Any further keys a journey's dialogue needs.
    pub extra: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub id: JourneyId,
    pub display_name: &'static str,
    /// The translation is already cached, so no page table walk.
    pub is_direct_hit: bool,
    pub primary_answer: PermissionAnswer,
    pub fault_subtype: Option<FaultSubtype>,
    pub involves_copy_on_write: bool,
    pub involves_swap: bool,
    pub scenario: Scenario,
}

impl Journey {
    /// Populate `vars` with this journey's values using the default layout.
    pub fn initialize(&self, vars: &mut Vars) {
        self.initialize_with(vars, &AddressLayout::default());
    }

    /// Populate `vars` with this journey's values. Every key written here is
    /// overwritten on each call.
    pub fn initialize_with(&self, vars: &mut Vars, layout: &AddressLayout) {
        let s = &self.scenario;
        let split = layout.split(s.virtual_address);

        vars.set("journey", self.display_name);
        vars.set("va", split.hex());
        vars.set("hex", split.hex());
        vars.set("vaBin", split.binary());
        vars.set("process", format!("Process {}", self.id.0));
        vars.set("operation", s.operation);
        vars.set("instruction", s.instruction);
        vars.set("vpn", split.vpn_binary());
        vars.set("vpnHex", split.vpn_hex());
        vars.set("offset", split.offset_binary());
        vars.set("offsetHex", split.offset_hex());
        vars.set("pfn", s.pfn);
        if let Some(pfn_cow) = s.pfn_cow {
            vars.set("pfnCow", pfn_cow);
        }
        let expected_floor = match s.expected_floor {
            Some(floor) => floor.to_string(),
            None => "?".to_string(),
        };
        vars.set("expectedFloor", expected_floor);
        vars.set("tlbResult", if self.is_direct_hit { "hit" } else { "miss" });
        let [opt_b, opt_c] = self.distractors(&split, layout);
        vars.set("optA", split.binary());
        vars.set("optB", opt_b);
        vars.set("optC", opt_c);
        for (k, v) in s.extra {
            vars.set(*k, *v);
        }
    }

    /// The scripted wrong answers fit the default layout only. Other widths
    /// flip the lowest and the highest address bit instead.
    fn distractors(&self, split: &AddressSplit, layout: &AddressLayout) -> [String; 2] {
        if *layout == AddressLayout::default() {
            return self.scenario.distractors.map(str::to_string);
        }
        let bits = layout.address_bits();
        let low = split.value ^ 1;
        let high = split.value ^ (1 << (bits - 1));
        [format_nibbles(low, bits), format_nibbles(high, bits)]
    }

    /// After "Allow Access" is confirmed in RAM: a cached translation is
    /// done, a TLB miss has to retry the instruction first.
    pub fn phase_after_ram_confirm(&self) -> &'static str {
        if self.is_direct_hit {
            phase::RAM_FINISH
        } else {
            phase::RAM_RETRY_TLB_MISS
        }
    }

    /// RAM is full after a copy-on-write, so a frame has to be evicted.
    pub fn needs_swap_after_cow(&self) -> bool {
        self.involves_copy_on_write && self.involves_swap
    }

    pub fn disk_phase(&self) -> Option<&'static str> {
        match self.fault_subtype? {
            FaultSubtype::LazyLoading => Some(phase::DISK_LAZY_LOADING),
            FaultSubtype::SwappedOut => Some(phase::DISK_SWAP_RETRIEVAL),
            FaultSubtype::LazyAllocation => None,
        }
    }

    pub fn disk_prompt_dialogue(&self) -> Option<&'static str> {
        match self.fault_subtype? {
            FaultSubtype::LazyLoading => Some("rooms.disk_room.lazy_loading_prompt"),
            FaultSubtype::SwappedOut => Some("rooms.disk_room.swap_retrieval_prompt"),
            FaultSubtype::LazyAllocation => None,
        }
    }

    /// Var writes applied on entering the swap district.
    pub fn apply_swap_entry(&self, vars: &mut Vars) {
        match self.fault_subtype {
            Some(FaultSubtype::LazyLoading) => vars.set("slot", "1"),
            Some(FaultSubtype::LazyAllocation) => {
                if let Some(pfn_cow) = self.scenario.pfn_cow {
                    vars.set("pfn", pfn_cow);
                }
                vars.set("slot", "0");
            }
            _ => {}
        }
    }

    pub fn phase_after_swap(&self) -> Option<&'static str> {
        match self.fault_subtype? {
            FaultSubtype::LazyLoading => Some(phase::SWAP_LAZY_LOADING),
            FaultSubtype::LazyAllocation => Some(phase::SWAP_LAZY_ALLOC),
            FaultSubtype::SwappedOut => None,
        }
    }

    pub fn dialogue_after_swap(&self) -> Option<&'static str> {
        match self.fault_subtype? {
            FaultSubtype::LazyLoading => Some("rooms.ram_room.after_swap_for_lazy_loading"),
            FaultSubtype::LazyAllocation => Some("rooms.ram_room.after_swap_for_lazy_alloc"),
            FaultSubtype::SwappedOut => None,
        }
    }

    /// The second lazy allocation visit turns the read into a write.
    pub fn apply_second_visit(&self, vars: &mut Vars) {
        let write = format!("write {} hello", format_hex(self.scenario.virtual_address));
        vars.set("instruction", write);
        vars.set("operation", "write");
    }
}

/// Ordered registry of journeys.
#[derive(Debug, Clone)]
pub struct JourneyCatalog {
    journeys: Vec<Journey>,
}

impl JourneyCatalog {
    /// The seven journeys the tutorial ships with.
    pub fn standard() -> Self {
        Self {
            journeys: standard_journeys(),
        }
    }

    pub fn get(&self, id: JourneyId) -> Option<&Journey> {
        self.journeys.iter().find(|j| j.id == id)
    }

    /// Look a journey up by the number a player typed.
    pub fn by_number(&self, number: u32) -> Option<&Journey> {
        u8::try_from(number).ok().and_then(|n| self.get(JourneyId(n)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Journey> {
        self.journeys.iter()
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }
}

fn standard_journeys() -> Vec<Journey> {
    vec![
        Journey {
            id: JourneyId(1),
            display_name: "Lucky",
            is_direct_hit: true,
            primary_answer: PermissionAnswer::AllowAccess,
            fault_subtype: None,
            involves_copy_on_write: false,
            involves_swap: false,
            scenario: Scenario {
                virtual_address: 0x2A,
                operation: "read",
                instruction: "read 0x2A",
                pfn: "0x3",
                pfn_cow: None,
                expected_floor: None,
                distractors: ["0010 0101", "0101 0010"],
                extra: &[],
            },
        },
        Journey {
            id: JourneyId(2),
            display_name: "TLB Miss - No Fault",
            is_direct_hit: false,
            primary_answer: PermissionAnswer::AllowAccess,
            fault_subtype: None,
            involves_copy_on_write: false,
            involves_swap: false,
            scenario: Scenario {
                virtual_address: 0x5C,
                operation: "read",
                instruction: "read 0x5C",
                pfn: "0x3",
                pfn_cow: None,
                expected_floor: Some(1),
                distractors: ["0101 0011", "1100 0101"],
                extra: &[],
            },
        },
        Journey {
            id: JourneyId(3),
            display_name: "Permission Violation",
            is_direct_hit: false,
            primary_answer: PermissionAnswer::Segfault,
            fault_subtype: None,
            involves_copy_on_write: false,
            involves_swap: false,
            scenario: Scenario {
                virtual_address: 0xFF,
                operation: "read",
                instruction: "read 0xFF",
                pfn: "N/A",
                pfn_cow: None,
                expected_floor: Some(3),
                distractors: ["1111 0000", "0000 1111"],
                extra: &[],
            },
        },
        Journey {
            id: JourneyId(4),
            display_name: "Swapped-Out Page",
            is_direct_hit: false,
            primary_answer: PermissionAnswer::PageFault,
            fault_subtype: Some(FaultSubtype::SwappedOut),
            involves_copy_on_write: false,
            involves_swap: false,
            scenario: Scenario {
                virtual_address: 0x7B,
                operation: "read",
                instruction: "read 0x7B",
                pfn: "0x2",
                pfn_cow: None,
                expected_floor: Some(1),
                distractors: ["0111 1101", "1011 0111"],
                extra: &[("slot", "0")],
            },
        },
        Journey {
            id: JourneyId(5),
            display_name: "Pure COW",
            is_direct_hit: false,
            primary_answer: PermissionAnswer::ProtectionFault,
            fault_subtype: None,
            involves_copy_on_write: true,
            involves_swap: false,
            scenario: Scenario {
                virtual_address: 0x64,
                operation: "write",
                instruction: "write 0x64 hello",
                pfn: "0x9",
                pfn_cow: Some("0x2"),
                expected_floor: Some(1),
                distractors: ["0110 0010", "0100 0110"],
                extra: &[],
            },
        },
        Journey {
            id: JourneyId(6),
            display_name: "Lazy Loading",
            is_direct_hit: false,
            primary_answer: PermissionAnswer::PageFault,
            fault_subtype: Some(FaultSubtype::LazyLoading),
            involves_copy_on_write: false,
            involves_swap: true,
            scenario: Scenario {
                virtual_address: 0x8E,
                operation: "load",
                instruction: "load treasure_map.bin 0x8E",
                pfn: "0x5",
                pfn_cow: None,
                expected_floor: Some(2),
                distractors: ["1000 1101", "0111 1110"],
                extra: &[
                    ("file", "treasure_map.bin"),
                    ("pageIndex", "0"),
                    ("diskBlock", "C"),
                    ("optA_pg", "0"),
                    ("optB_pg", "1"),
                    ("optC_pg", "14"),
                ],
            },
        },
        Journey {
            id: JourneyId(7),
            display_name: "Lazy Allocation",
            is_direct_hit: false,
            primary_answer: PermissionAnswer::PageFault,
            fault_subtype: Some(FaultSubtype::LazyAllocation),
            involves_copy_on_write: true,
            involves_swap: true,
            scenario: Scenario {
                virtual_address: 0x45,
                operation: "read",
                instruction: "read 0x45",
                pfn: "0x9",
                pfn_cow: Some("0x6"),
                expected_floor: Some(1),
                distractors: ["0100 0100", "0101 0100"],
                extra: &[],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_seven_ordered_journeys() {
        let catalog = JourneyCatalog::standard();
        assert_eq!(catalog.len(), 7);
        let ids: Vec<u8> = catalog.iter().map(|j| j.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(catalog.iter().filter(|j| j.id == JourneyId::FIRST).count(), 1);
    }

    #[test]
    fn by_number_rejects_out_of_range() {
        let catalog = JourneyCatalog::standard();
        assert!(catalog.by_number(0).is_none());
        assert!(catalog.by_number(8).is_none());
        assert!(catalog.by_number(300).is_none());
        assert_eq!(catalog.by_number(3).unwrap().display_name, "Permission Violation");
    }

    #[test]
    fn lucky_vars() {
        let catalog = JourneyCatalog::standard();
        let mut vars = Vars::new();
        catalog.get(JourneyId(1)).unwrap().initialize(&mut vars);
        assert_eq!(vars.get("journey"), Some("Lucky"));
        assert_eq!(vars.get("va"), Some("0x2A"));
        assert_eq!(vars.get("vaBin"), Some("0010 1010"));
        assert_eq!(vars.get("vpn"), Some("0010"));
        assert_eq!(vars.get("offsetHex"), Some("0xA"));
        assert_eq!(vars.get("pfn"), Some("0x3"));
        assert_eq!(vars.get("expectedFloor"), Some("?"));
        assert_eq!(vars.get("tlbResult"), Some("hit"));
        assert_eq!(vars.get("process"), Some("Process 1"));
    }

    #[test]
    fn expected_floors_do_not_depend_on_layout() {
        let catalog = JourneyCatalog::standard();
        for bits in [3, 4, 5, 8] {
            let layout = AddressLayout::new(bits);
            let floors: Vec<String> = catalog
                .iter()
                .map(|j| {
                    let mut vars = Vars::new();
                    j.initialize_with(&mut vars, &layout);
                    vars.get_or_unknown("expectedFloor").to_string()
                })
                .collect();
            assert_eq!(floors, vec!["?", "1", "3", "1", "1", "2", "1"], "bits={}", bits);
        }
    }

    #[test]
    fn quiz_options_match_the_layout_width() {
        let journey = JourneyCatalog::standard().get(JourneyId(2)).cloned().unwrap();
        for bits in [3, 5] {
            let mut vars = Vars::new();
            journey.initialize_with(&mut vars, &AddressLayout::new(bits));
            let a = vars.get_or_unknown("optA").to_string();
            let b = vars.get_or_unknown("optB").to_string();
            let c = vars.get_or_unknown("optC").to_string();
            assert_eq!(a.len(), b.len(), "bits={}", bits);
            assert_eq!(a.len(), c.len(), "bits={}", bits);
            assert!(a != b && a != c && b != c, "bits={}", bits);
        }

        let mut vars = Vars::new();
        journey.initialize(&mut vars);
        assert_eq!(vars.get("optB"), Some("0101 0011"));
    }

    #[test]
    fn initialize_is_idempotent() {
        let journey = JourneyCatalog::standard().get(JourneyId(6)).cloned().unwrap();
        let mut once = Vars::new();
        journey.initialize(&mut once);
        let mut twice = once.clone();
        journey.initialize(&mut twice);
        assert_eq!(once, twice);
        assert_eq!(once.get("file"), Some("treasure_map.bin"));
    }

    #[test]
    fn initialize_overwrites_owned_keys() {
        let catalog = JourneyCatalog::standard();
        let mut vars = Vars::new();
        catalog.get(JourneyId(5)).unwrap().initialize(&mut vars);
        vars.set("pfn", "0x2");
        catalog.get(JourneyId(5)).unwrap().initialize(&mut vars);
        assert_eq!(vars.get("pfn"), Some("0x9"));
    }

    #[test]
    fn routing_helpers() {
        let catalog = JourneyCatalog::standard();
        let lucky = catalog.get(JourneyId(1)).unwrap();
        let tlb_miss = catalog.get(JourneyId(2)).unwrap();
        let cow = catalog.get(JourneyId(5)).unwrap();
        let loading = catalog.get(JourneyId(6)).unwrap();
        let alloc = catalog.get(JourneyId(7)).unwrap();

        assert_eq!(lucky.phase_after_ram_confirm(), "ram_finish");
        assert_eq!(tlb_miss.phase_after_ram_confirm(), "ram_retry_tlb_miss");
        assert!(!cow.needs_swap_after_cow());
        assert!(alloc.needs_swap_after_cow());
        assert_eq!(loading.disk_phase(), Some("disk_lazy_loading"));
        assert_eq!(loading.phase_after_swap(), Some("swap_lazy_loading"));
        assert_eq!(alloc.phase_after_swap(), Some("swap_lazy_alloc"));
    }

    #[test]
    fn swap_entry_moves_lazy_allocation_to_cow_frame() {
        let alloc = JourneyCatalog::standard().get(JourneyId(7)).cloned().unwrap();
        let mut vars = Vars::new();
        alloc.initialize(&mut vars);
        alloc.apply_swap_entry(&mut vars);
        assert_eq!(vars.get("pfn"), Some("0x6"));
        assert_eq!(vars.get("slot"), Some("0"));

        alloc.apply_second_visit(&mut vars);
        assert_eq!(vars.get("instruction"), Some("write 0x45 hello"));
    }

    #[test]
    fn previous_journey() {
        assert_eq!(JourneyId(1).previous(), None);
        assert_eq!(JourneyId(4).previous(), Some(JourneyId(3)));
    }
}
