//! Service-level policy: how long an order of a given priority may take.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::Priority;

/// Longest allowance a policy may grant: one hundred years.
pub const MAX_SLA_HOURS: u32 = 100 * 366 * 24;

/// The SLA table is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// No priorities configured.
    #[error("SLA policy has no entries")]
    EmptyPolicy,

    /// A priority was given a zero-hour allowance.
    #[error("SLA hours for priority {priority} must be positive")]
    ZeroHours { priority: Priority },

    /// A priority was given more hours than a deadline can represent.
    #[error("SLA hours for priority {priority} exceed {max}: {hours}")]
    ExcessiveHours {
        priority: Priority,
        hours: u32,
        max: u32,
    },

    /// Priorities must cover 1..=N without gaps.
    #[error("SLA policy is missing priority {priority}")]
    MissingPriority { priority: Priority },

    /// Lookup of a priority the policy does not define.
    #[error("Unknown priority {priority}")]
    UnknownPriority { priority: Priority },
}

/// Immutable mapping from priority to allowed processing hours.
///
/// Construction enforces that the table is non-empty, every allowance is
/// positive and at most [`MAX_SLA_HOURS`], and priorities run contiguously
/// from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Priority, u32>", into = "BTreeMap<Priority, u32>")]
pub struct SlaPolicy {
    hours_by_priority: BTreeMap<Priority, u32>,
}

impl SlaPolicy {
    /// Builds a policy, validating the table.
    pub fn new(hours_by_priority: BTreeMap<Priority, u32>) -> Result<Self, ConfigurationError> {
        if hours_by_priority.is_empty() {
            return Err(ConfigurationError::EmptyPolicy);
        }

        for (&priority, &hours) in &hours_by_priority {
            if hours == 0 {
                return Err(ConfigurationError::ZeroHours { priority });
            }
            if hours > MAX_SLA_HOURS {
                return Err(ConfigurationError::ExcessiveHours {
                    priority,
                    hours,
                    max: MAX_SLA_HOURS,
                });
            }
        }

        let highest_level = hours_by_priority
            .keys()
            .map(Priority::level)
            .max()
            .unwrap_or(0);
        for level in 1..=highest_level {
            let priority = Priority::new(level);
            if !hours_by_priority.contains_key(&priority) {
                return Err(ConfigurationError::MissingPriority { priority });
            }
        }

        // Level 0 is below the contiguous range.
        if hours_by_priority.contains_key(&Priority::new(0)) {
            return Err(ConfigurationError::UnknownPriority {
                priority: Priority::new(0),
            });
        }

        Ok(Self { hours_by_priority })
    }

    /// Builds a policy from `(level, hours)` pairs.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (u8, u32)>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            pairs
                .into_iter()
                .map(|(level, hours)| (Priority::new(level), hours))
                .collect(),
        )
    }

    /// The default three-tier table: 24h, 48h, 72h.
    pub fn standard() -> Self {
        Self {
            hours_by_priority: BTreeMap::from([
                (Priority::new(1), 24),
                (Priority::new(2), 48),
                (Priority::new(3), 72),
            ]),
        }
    }

    /// Returns the allowed hours for `priority`.
    pub fn hours_for(&self, priority: Priority) -> Result<u32, ConfigurationError> {
        self.hours_by_priority
            .get(&priority)
            .copied()
            .ok_or(ConfigurationError::UnknownPriority { priority })
    }

    /// Returns the configured priorities, most urgent first.
    pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
        self.hours_by_priority.keys().copied()
    }
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<BTreeMap<Priority, u32>> for SlaPolicy {
    type Error = ConfigurationError;

    fn try_from(value: BTreeMap<Priority, u32>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlaPolicy> for BTreeMap<Priority, u32> {
    fn from(policy: SlaPolicy) -> Self {
        policy.hours_by_priority
    }
}
