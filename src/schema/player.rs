use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::journey::{Journey, JourneyId};
use super::address::AddressLayout;

/// Newtype wrapper for player IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

/// Value returned for vars that were never set.
pub const UNKNOWN: &str = "?";

/// Per-player template substitution values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars(HashMap<String, String>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `"?"` when unset.
    pub fn get_or_unknown(&self, key: &str) -> &str {
        self.get(key).unwrap_or(UNKNOWN)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Vars(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Where a player is in the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub journey: Option<JourneyId>,
    pub phase: String,
    pub vars: Vars,
}

impl PlayerState {
    pub fn new(phase: &str) -> Self {
        Self {
            journey: None,
            phase: phase.to_string(),
            vars: Vars::new(),
        }
    }

    /// Make `journey` the active one. Vars are scoped to a single
    /// selection, so the previous journey's values are dropped first.
    pub fn assign_journey(&mut self, journey: &Journey, layout: &AddressLayout) {
        self.journey = Some(journey.id);
        self.vars = Vars::new();
        journey.initialize_with(&mut self.vars, layout);
    }

    pub fn var(&self, key: &str) -> &str {
        self.vars.get_or_unknown(key)
    }
}
