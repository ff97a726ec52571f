//! Liveness aggregation
//!
//! Reports arrive independently per application and are upserted by id; the
//! latest report for an id wins. Entries are never evicted: a report for an
//! application that has since left the listing still counts as active until
//! the process restarts.

use std::sync::Arc;

use dashmap::DashMap;

use crate::models::{enabled_count, Application, ApplicationId};

/// Live/active/inactive counts shown in the dashboard header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    /// Every retrieved application
    pub total: usize,
    /// Applications whose latest report is live
    pub active: usize,
    /// Enabled applications not reported live
    pub inactive: usize,
}

/// Thread-safe id → live mapping
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct StatusAggregator {
    reports: Arc<DashMap<ApplicationId, bool>>,
}

impl StatusAggregator {
    /// Aggregator with no reports
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest liveness of an application
    pub fn report_status(&self, id: ApplicationId, is_live: bool) {
        self.reports.insert(id, is_live);
    }

    /// Latest report for an application
    pub fn status_of(&self, id: ApplicationId) -> Option<bool> {
        self.reports.get(&id).map(|entry| *entry.value())
    }

    /// Number of ids whose latest report is live
    ///
    /// Counts every stored report, including ids missing from `applications`.
    pub fn active_count(&self, _applications: &[Application]) -> usize {
        self.reports.iter().filter(|entry| *entry.value()).count()
    }

    /// Enabled applications minus active, never below zero
    pub fn inactive_count(&self, applications: &[Application]) -> usize {
        enabled_count(applications).saturating_sub(self.active_count(applications))
    }

    /// Header counts for an application list
    pub fn summary(&self, applications: &[Application]) -> StatusSummary {
        StatusSummary {
            total: applications.len(),
            active: self.active_count(applications),
            inactive: self.inactive_count(applications),
        }
    }

    /// Number of distinct ids that have reported
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether nothing has reported yet
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
