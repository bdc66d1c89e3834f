//! Bypass test status dashboard
//!
//! Tracks per-category community test runs: who is testing, the last
//! result, and aggregate stats. Running tests that never complete are
//! cleared after a timeout.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

const TESTING_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CategoryStatus {
    success_rate: Option<u32>,
    last_tested: Option<DateTime<Utc>>,
    testing: bool,
    tester: Option<String>,
    started_at: Option<Instant>,
    test_count: u32,
}

impl Default for CategoryStatus {
    fn default() -> Self {
        Self {
            success_rate: None,
            last_tested: None,
            testing: false,
            tester: None,
            started_at: None,
            test_count: 0,
        }
    }
}

/// Public view of a category status (start instant stays internal)
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub success_rate: String,
    pub last_tested: Option<String>,
    pub testing: bool,
    pub tester: Option<String>,
    pub test_count: u32,
}

impl From<&CategoryStatus> for StatusView {
    fn from(status: &CategoryStatus) -> Self {
        Self {
            success_rate: status
                .success_rate
                .map(|r| format!("{}%", r))
                .unwrap_or_else(|| "unknown".to_string()),
            last_tested: status.last_tested.map(|t| t.to_rfc3339()),
            testing: status.testing,
            tester: status.tester.clone(),
            test_count: status.test_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub first_tester: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_categories: usize,
    pub tested_today: usize,
    pub currently_testing: usize,
    pub average_success_rate: u32,
    pub categories: HashMap<String, StatusView>,
}

pub struct DashboardService {
    statuses: Mutex<HashMap<String, CategoryStatus>>,
    stale_after: Duration,
}

impl DashboardService {
    pub fn new() -> Self {
        Self::with_timeout(TESTING_TIMEOUT)
    }

    fn with_timeout(stale_after: Duration) -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            stale_after,
        }
    }

    /// Status for a category, creating a default record on first read
    pub fn status(&self, category: &str) -> StatusView {
        let mut statuses = self.statuses.lock().unwrap();
        Self::clear_stale(&mut statuses, self.stale_after);
        StatusView::from(&*statuses.entry(category.to_string()).or_default())
    }

    /// Claim a test slot. Only the first tester per category and day wins.
    pub fn start_test(&self, category: &str, tester: &str) -> StartOutcome {
        let mut statuses = self.statuses.lock().unwrap();
        Self::clear_stale(&mut statuses, self.stale_after);

        let status = statuses.entry(category.to_string()).or_default();
        if status.testing {
            return StartOutcome {
                first_tester: false,
                reason: Some("already_testing"),
            };
        }
        if let Some(last) = status.last_tested {
            if last.date_naive() == Utc::now().date_naive() {
                return StartOutcome {
                    first_tester: false,
                    reason: Some("already_tested_today"),
                };
            }
        }

        status.testing = true;
        status.tester = Some(tester.to_string());
        status.started_at = Some(Instant::now());
        StartOutcome {
            first_tester: true,
            reason: None,
        }
    }

    /// Record a finished test. Errors on a category nobody ever touched.
    pub fn complete_test(&self, category: &str, success_rate: u32) -> Result<StatusView, String> {
        let mut statuses = self.statuses.lock().unwrap();
        let status = statuses
            .get_mut(category)
            .ok_or_else(|| "Category not found".to_string())?;

        status.success_rate = Some(success_rate);
        status.last_tested = Some(Utc::now());
        status.testing = false;
        status.tester = None;
        status.started_at = None;
        status.test_count += 1;
        Ok(StatusView::from(&*status))
    }

    pub fn cancel_test(&self, category: &str) -> Result<(), String> {
        let mut statuses = self.statuses.lock().unwrap();
        let status = statuses
            .get_mut(category)
            .ok_or_else(|| "Category not found".to_string())?;
        status.testing = false;
        status.tester = None;
        status.started_at = None;
        Ok(())
    }

    pub fn stats(&self) -> DashboardStats {
        let mut statuses = self.statuses.lock().unwrap();
        Self::clear_stale(&mut statuses, self.stale_after);

        let now = Utc::now();
        let mut tested_today = 0;
        let mut currently_testing = 0;
        let mut total_success = 0u64;
        let mut tested_count = 0u32;

        for status in statuses.values() {
            if status.testing {
                currently_testing += 1;
            }
            if let Some(last) = status.last_tested {
                if now - last < chrono::Duration::hours(24) {
                    tested_today += 1;
                }
            }
            if let Some(rate) = status.success_rate {
                total_success += rate as u64;
                tested_count += 1;
            }
        }

        DashboardStats {
            total_categories: statuses.len(),
            tested_today,
            currently_testing,
            average_success_rate: if tested_count > 0 {
                (total_success / tested_count as u64) as u32
            } else {
                0
            },
            categories: statuses
                .iter()
                .map(|(name, status)| (name.clone(), StatusView::from(status)))
                .collect(),
        }
    }

    fn clear_stale(statuses: &mut HashMap<String, CategoryStatus>, stale_after: Duration) {
        for (category, status) in statuses.iter_mut() {
            if let Some(started) = status.started_at {
                if status.testing && started.elapsed() > stale_after {
                    tracing::info!(
                        "Clearing stale test for {} (ran for {}s)",
                        category,
                        started.elapsed().as_secs()
                    );
                    status.testing = false;
                    status.tester = None;
                    status.started_at = None;
                }
            }
        }
    }
}

impl Default for DashboardService {
    fn default() -> Self {
        Self::new()
    }
}
