//! Scheduler configuration.
//!
//! Options are an explicit value threaded through the scheduling entry
//! points; there is no process-wide registry. Parsing is eager: an unknown
//! scheduler name fails before any graph is built.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Which cycle-assignment objective the schedulers pursue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerKind {
    /// As soon as possible: forward scheduling from the source.
    #[default]
    Asap,
    /// As late as possible: backward scheduling from the sink, then shifted
    /// so the source lands at cycle 0.
    Alap,
}

impl SchedulerKind {
    /// Canonical option spelling, also used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerKind::Asap => "ASAP",
            SchedulerKind::Alap => "ALAP",
        }
    }
}

impl std::fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asap") {
            Ok(SchedulerKind::Asap)
        } else if s.eq_ignore_ascii_case("alap") {
            Ok(SchedulerKind::Alap)
        } else {
            Err(ScheduleError::UnknownScheduler(s.to_string()))
        }
    }
}

/// The options the scheduling entry points recognize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Scheduling objective for the non-uniform schedulers.
    pub scheduler: SchedulerKind,
    /// Run the uniforming pass instead of plain ASAP/ALAP.
    pub uniform: bool,
    /// Exploit CNOT/CZ commutativity: suppress RAR and DAD edges.
    pub commute: bool,
    /// Render DOT graphs alongside the schedule.
    pub print_dot_graphs: bool,
    /// Where DOT files are written when rendering is enabled.
    pub output_dir: Option<PathBuf>,
    /// Master switch for the non-resource-constrained pre-pass.
    pub prescheduler: bool,
    /// Cap on consecutive no-progress cycle advances under resource
    /// constraints. Defaults to four times the critical path length.
    pub stall_limit: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::Asap,
            uniform: false,
            commute: false,
            print_dot_graphs: false,
            output_dir: None,
            prescheduler: true,
            stall_limit: None,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduling objective.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Enable or disable the uniforming pass.
    #[must_use]
    pub fn with_uniform(mut self, uniform: bool) -> Self {
        self.uniform = uniform;
        self
    }

    /// Enable or disable commutation-aware dependence construction.
    #[must_use]
    pub fn with_commute(mut self, commute: bool) -> Self {
        self.commute = commute;
        self
    }

    /// Enable DOT rendering, optionally into the given directory.
    #[must_use]
    pub fn with_dot_output(mut self, output_dir: Option<PathBuf>) -> Self {
        self.print_dot_graphs = true;
        self.output_dir = output_dir;
        self
    }

    /// Enable or disable the non-resource-constrained pre-pass.
    #[must_use]
    pub fn with_prescheduler(mut self, prescheduler: bool) -> Self {
        self.prescheduler = prescheduler;
        self
    }

    /// Override the resource-stall cap.
    #[must_use]
    pub fn with_stall_limit(mut self, stall_limit: u64) -> Self {
        self.stall_limit = Some(stall_limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_kind_parsing() {
        assert_eq!("ASAP".parse::<SchedulerKind>().unwrap(), SchedulerKind::Asap);
        assert_eq!("alap".parse::<SchedulerKind>().unwrap(), SchedulerKind::Alap);
        assert!(matches!(
            "greedy".parse::<SchedulerKind>(),
            Err(ScheduleError::UnknownScheduler(s)) if s == "greedy"
        ));
    }

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.scheduler, SchedulerKind::Asap);
        assert!(!config.uniform);
        assert!(!config.commute);
        assert!(config.prescheduler);
        assert!(config.stall_limit.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = SchedulerConfig::new()
            .with_scheduler(SchedulerKind::Alap)
            .with_commute(true)
            .with_stall_limit(128);
        assert_eq!(config.scheduler, SchedulerKind::Alap);
        assert!(config.commute);
        assert_eq!(config.stall_limit, Some(128));
    }
}
