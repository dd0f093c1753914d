/// Engine tuning, loaded from `config.ron`. Every field has a default, so
/// an empty `()` file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::content::ContentError;
use crate::schema::address::AddressLayout;
use crate::schema::event::Channel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between successive guide lines.
    pub line_delay_ms: u64,
    /// How long the calculator pretends to work.
    pub calculation_delay_ms: u64,
    pub page_offset_bits: u32,
    pub seed: u64,
    pub guide_prefix: String,
    pub quiz_prefix: String,
    pub calculator_prefix: String,
    pub clock_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line_delay_ms: 2000,
            calculation_delay_ms: 5000,
            page_offset_bits: 4,
            seed: 0,
            guide_prefix: "[Kernel Guardian] ".to_string(),
            quiz_prefix: "[Quiz] ".to_string(),
            calculator_prefix: "[Calculator] ".to_string(),
            clock_prefix: "[Clock] ".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }

    pub fn calculation_delay(&self) -> Duration {
        Duration::from_millis(self.calculation_delay_ms)
    }

    pub fn layout(&self) -> AddressLayout {
        AddressLayout::new(self.page_offset_bits)
    }

    pub fn prefix(&self, channel: Channel) -> &str {
        match channel {
            Channel::Guide => &self.guide_prefix,
            Channel::Quiz => &self.quiz_prefix,
            Channel::Calculator => &self.calculator_prefix,
            Channel::Clock => &self.clock_prefix,
            Channel::System => "",
        }
    }
}
