//! Which Graph `actions` entries count as conversions.
//!
//! The action taxonomy belongs to Meta and changes over time, so the lists
//! are data: the defaults below can be replaced from configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::providers::meta_graph::response::ActionEntry;

pub const DEFAULT_CONVERSION_ACTION_TYPES: [&str; 6] = [
    "offsite_conversion.custom",
    "lead",
    "purchase",
    "submit_application",
    "complete_registration",
    "onsite_conversion.messaging_conversation_started_7d",
];

pub const DEFAULT_REVENUE_ACTION_TYPES: [&str; 1] = ["purchase"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversionRules {
    /// `action_type`s summed into the conversion count.
    pub conversion_action_types: Vec<String>,
    /// `action_type`s of `action_values` summed into revenue.
    pub revenue_action_types: Vec<String>,
}

impl Default for ConversionRules {
    fn default() -> Self {
        Self {
            conversion_action_types: DEFAULT_CONVERSION_ACTION_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            revenue_action_types: DEFAULT_REVENUE_ACTION_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Conversions found in one insight row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionTally {
    pub conversions: u64,
    pub revenue: f64,
    pub details: IndexMap<String, u64>,
}

impl ConversionRules {
    pub fn counts_as_conversion(&self, action_type: &str) -> bool {
        self.conversion_action_types.iter().any(|t| t == action_type)
    }

    pub fn counts_as_revenue(&self, action_type: &str) -> bool {
        self.revenue_action_types.iter().any(|t| t == action_type)
    }

    pub fn tally(&self, actions: &[ActionEntry], action_values: &[ActionEntry]) -> ConversionTally {
        let mut tally = ConversionTally::default();
        for action in actions {
            if self.counts_as_conversion(&action.action_type) {
                let value = action.count();
                *tally.details.entry(action.action_type.clone()).or_default() += value;
                tally.conversions += value;
            }
        }
        tally.revenue = action_values
            .iter()
            .filter(|a| self.counts_as_revenue(&a.action_type))
            .map(|a| a.value)
            .sum();
        tally
    }
}
