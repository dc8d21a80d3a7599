//! Front-desk dashboard summary.

use crate::model::package::Package;
use crate::repo::{PackageRepository, ResidentRepository};
use crate::service::error::ServiceResult;

/// Recent packages shown on the dashboard by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Dashboard counters and recent activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskSummary {
    pub resident_count: usize,
    pub package_count: usize,
    pub picked_up_count: usize,
    /// Newest first by receipt time.
    pub recent_packages: Vec<Package>,
}

impl DeskSummary {
    pub fn pending_count(&self) -> usize {
        self.package_count - self.picked_up_count
    }
}

pub struct SummaryService<R: ResidentRepository + PackageRepository> {
    repo: R,
}

impl<R: ResidentRepository + PackageRepository> SummaryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds the summary with at most `recent_limit` recent packages.
    pub fn summary(&self, recent_limit: usize) -> ServiceResult<DeskSummary> {
        let resident_count = self.repo.list_residents()?.len();
        let mut packages = self.repo.list_packages()?;
        let package_count = packages.len();
        let picked_up_count = packages.iter().filter(|package| package.picked_up).count();

        // Stable sort keeps persistence order among equal receipt times.
        packages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        packages.truncate(recent_limit);

        Ok(DeskSummary {
            resident_count,
            package_count,
            picked_up_count,
            recent_packages: packages,
        })
    }
}
