//! Group effects — secondary keys that follow a primary key's changes.
//!
//! The configuration is loaded once at process start and immutable
//! thereafter. Each trigger key names target keys that receive either the
//! same value or its flag-inverse whenever the trigger is updated.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::HearthError;
use crate::flag;
use crate::key::KeyPath;

/// How a group target follows its trigger key.
///
/// This is the canonical effect enumeration for the whole workspace —
/// conditional variants (apply-only-when-true and friends) are not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupEffect {
    /// The target receives the trigger's value unchanged.
    Same,
    /// The target receives the flag-inverse of the trigger's value.
    Invert,
}

impl GroupEffect {
    /// Compute the value a target key receives for a trigger value.
    #[must_use]
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Same => value.to_string(),
            Self::Invert => flag::invert(value).to_string(),
        }
    }
}

/// A single target of a group entry.
#[derive(Debug, Clone)]
pub struct GroupTarget {
    /// The key written when the trigger changes.
    pub key: KeyPath,
    /// How the written value relates to the trigger's value.
    pub effect: GroupEffect,
}

/// Static mapping from trigger keys to their group targets.
#[derive(Debug, Clone, Default)]
pub struct GroupConfig {
    entries: HashMap<KeyPath, Vec<GroupTarget>>,
}

impl GroupConfig {
    /// Add a target for a trigger key.
    pub fn insert(&mut self, trigger: KeyPath, target: KeyPath, effect: GroupEffect) {
        self.entries.entry(trigger).or_default().push(GroupTarget {
            key: target,
            effect,
        });
    }

    /// Targets configured for `key`, if any.
    #[must_use]
    pub fn targets(&self, key: &KeyPath) -> Option<&[GroupTarget]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of trigger keys with at least one target.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no trigger keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a config from the raw string maps a TOML config file deserializes
/// into. The inner map is ordered so target application order is stable.
impl TryFrom<BTreeMap<String, BTreeMap<String, GroupEffect>>> for GroupConfig {
    type Error = HearthError;

    fn try_from(
        raw: BTreeMap<String, BTreeMap<String, GroupEffect>>,
    ) -> Result<Self, Self::Error> {
        let mut config = Self::default();
        for (trigger, targets) in raw {
            let trigger = KeyPath::parse(&trigger)?;
            for (target, effect) in targets {
                config.insert(trigger.clone(), KeyPath::parse(&target)?, effect);
            }
        }
        Ok(config)
    }
}
