//! Which reference cycles are tolerated.
//!
//! Some cycles cannot be broken by a schema change and are dealt with in
//! configuration instead. A cycle is:
//!
//! - **ignored** when it is one of the allow-listed ordered patterns, read
//!   from any starting type;
//! - **excused** when its member set satisfies an [`ExcusedRule`];
//! - **reportable** otherwise.
//!
//! Ignored patterns are checked first.

use std::collections::BTreeSet;
use std::fmt;

use refgraph_core::ResourceType;
use refgraph_core::config::{ExcusedMatch, PolicyConfig};
use serde::Serialize;

use crate::graph::Cycle;

pub const ROUTING_QUEUE: &str = "genesyscloud_routing_queue";
pub const ROUTING_EMAIL_ROUTE: &str = "genesyscloud_routing_email_route";
pub const EDGES_SITE: &str = "genesyscloud_telephony_providers_edges_site";
pub const EDGES_TRUNK_BASE_SETTINGS: &str =
    "genesyscloud_telephony_providers_edges_trunkbasesettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleClass {
    Ignored,
    Excused,
    Reportable,
}

impl CycleClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Excused => "excused",
            Self::Reportable => "reportable",
        }
    }
}

impl fmt::Display for CycleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered cycle pattern, stored open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IgnoredPattern {
    sequence: Vec<ResourceType>,
}

impl IgnoredPattern {
    /// Accepts open (`[a, b]`) or closed (`[a, b, a]`) sequences.
    pub fn new<I, T>(sequence: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        let mut sequence: Vec<ResourceType> = sequence.into_iter().map(Into::into).collect();
        if sequence.len() > 1 && sequence.first() == sequence.last() {
            sequence.pop();
        }
        Self { sequence }
    }

    #[must_use]
    pub fn sequence(&self) -> &[ResourceType] {
        &self.sequence
    }

    #[must_use]
    pub fn matches(&self, cycle: &Cycle) -> bool {
        !self.sequence.is_empty() && cycle.is_rotation_of(&self.sequence)
    }
}

/// A member set that excuses cycles under a given [`ExcusedMatch`] mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcusedRule {
    pub members: BTreeSet<ResourceType>,
    pub mode: ExcusedMatch,
}

impl ExcusedRule {
    pub fn new<I, T>(members: I, mode: ExcusedMatch) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// An empty member set never matches.
    #[must_use]
    pub fn matches(&self, cycle: &Cycle) -> bool {
        if self.members.is_empty() {
            return false;
        }
        match self.mode {
            ExcusedMatch::Contains => self.members.iter().all(|m| cycle.contains(m.as_str())),
            ExcusedMatch::Within => cycle.types().iter().all(|t| self.members.contains(t)),
            ExcusedMatch::Exact => cycle.members() == self.members.iter().collect::<BTreeSet<_>>(),
        }
    }
}

/// The full set of tolerance rules for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CyclePolicy {
    pub ignored: Vec<IgnoredPattern>,
    pub excused: Vec<ExcusedRule>,
}

impl CyclePolicy {
    /// A policy that tolerates nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in export rules.
    ///
    /// - Email routes reference an inbound queue and queues reference an
    ///   outbound email route; resolved in config at apply time.
    /// - Edge sites and trunk base settings reference each other; the
    ///   site outbound routes resource is the workaround.
    #[must_use]
    pub fn export_defaults() -> Self {
        Self::new()
            .with_ignored([ROUTING_QUEUE, ROUTING_EMAIL_ROUTE])
            .with_excused([EDGES_TRUNK_BASE_SETTINGS, EDGES_SITE], ExcusedMatch::Contains)
    }

    /// Policy from project configuration, layered on the built-in rules
    /// unless `builtin_defaults` is off.
    #[must_use]
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut policy = if config.builtin_defaults {
            Self::export_defaults()
        } else {
            Self::new()
        };
        for pattern in &config.ignored {
            policy = policy.with_ignored(pattern.iter().map(String::as_str));
        }
        for rule in &config.excused {
            policy = policy.with_excused(rule.members.iter().map(String::as_str), rule.mode);
        }
        policy
    }

    #[must_use]
    pub fn with_ignored<I, T>(mut self, sequence: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        let pattern = IgnoredPattern::new(sequence);
        if !self.ignored.contains(&pattern) {
            self.ignored.push(pattern);
        }
        self
    }

    #[must_use]
    pub fn with_excused<I, T>(mut self, members: I, mode: ExcusedMatch) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        let rule = ExcusedRule::new(members, mode);
        if !self.excused.contains(&rule) {
            self.excused.push(rule);
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty() && self.excused.is_empty()
    }

    #[must_use]
    pub fn classify(&self, cycle: &Cycle) -> CycleClass {
        if self.ignored.iter().any(|p| p.matches(cycle)) {
            CycleClass::Ignored
        } else if self.excused.iter().any(|r| r.matches(cycle)) {
            CycleClass::Excused
        } else {
            CycleClass::Reportable
        }
    }
}
