/// Guards shared by the room and button transition tables.

use crate::schema::journey::{FaultSubtype, Journey};

/// Which phases a rule applies in.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PhaseGuard {
    Any,
    OneOf(&'static [&'static str]),
}

impl PhaseGuard {
    pub(crate) fn allows(&self, phase: &str) -> bool {
        match self {
            PhaseGuard::Any => true,
            PhaseGuard::OneOf(phases) => phases.contains(&phase),
        }
    }

    pub(crate) fn phases(&self) -> &'static [&'static str] {
        match self {
            PhaseGuard::Any => &[],
            PhaseGuard::OneOf(phases) => phases,
        }
    }
}

/// Which journeys a rule applies to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum JourneyGuard {
    Any,
    Assigned,
    DirectHit,
    PageWalk,
    Subtype(FaultSubtype),
    CopyOnWrite,
    SwapAfterCow,
    FinishAfterCow,
    Swap,
}

impl JourneyGuard {
    pub(crate) fn allows(&self, journey: Option<&Journey>) -> bool {
        let Some(j) = journey else {
            return matches!(self, JourneyGuard::Any);
        };
        match self {
            JourneyGuard::Any | JourneyGuard::Assigned => true,
            JourneyGuard::DirectHit => j.is_direct_hit,
            JourneyGuard::PageWalk => !j.is_direct_hit,
            JourneyGuard::Subtype(s) => j.fault_subtype == Some(*s),
            JourneyGuard::CopyOnWrite => j.involves_copy_on_write,
            JourneyGuard::SwapAfterCow => j.needs_swap_after_cow(),
            JourneyGuard::FinishAfterCow => j.involves_copy_on_write && !j.needs_swap_after_cow(),
            JourneyGuard::Swap => j.involves_swap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::journey::{JourneyCatalog, JourneyId};

    #[test]
    fn phase_guard() {
        assert!(PhaseGuard::Any.allows("anything"));
        let guard = PhaseGuard::OneOf(&["a", "b"]);
        assert!(guard.allows("b"));
        assert!(!guard.allows("c"));
    }

    #[test]
    fn journey_guards() {
        let catalog = JourneyCatalog::standard();
        let lucky = catalog.get(JourneyId(1));
        let cow = catalog.get(JourneyId(5));
        let alloc = catalog.get(JourneyId(7));

        assert!(JourneyGuard::Any.allows(None));
        assert!(!JourneyGuard::Assigned.allows(None));
        assert!(JourneyGuard::DirectHit.allows(lucky));
        assert!(!JourneyGuard::PageWalk.allows(lucky));
        assert!(JourneyGuard::FinishAfterCow.allows(cow));
        assert!(!JourneyGuard::SwapAfterCow.allows(cow));
        assert!(JourneyGuard::SwapAfterCow.allows(alloc));
        assert!(JourneyGuard::Subtype(FaultSubtype::LazyAllocation).allows(alloc));
    }
}
