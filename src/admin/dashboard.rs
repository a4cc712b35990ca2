use tracing::error;

use crate::catalog::ViewState;
use crate::models::{AdminDashboardStats, BookingStatus, DailyBookings};
use crate::services::{ServiceResult, SkillMentorService};

#[derive(Clone, Debug, PartialEq)]
pub struct StatusSlice {
    pub status: BookingStatus,
    pub label: &'static str,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardView {
    pub stats: AdminDashboardStats,
    pub status_breakdown: Vec<StatusSlice>,
    pub daily: Vec<DailyBookings>,
}

impl DashboardView {
    fn new(stats: AdminDashboardStats, daily: Vec<DailyBookings>) -> Self {
        let status_breakdown = vec![
            StatusSlice {
                status: BookingStatus::Pending,
                label: "Pending",
                value: stats.pending_sessions,
            },
            StatusSlice {
                status: BookingStatus::Accepted,
                label: "Accepted",
                value: stats.accepted_sessions,
            },
            StatusSlice {
                status: BookingStatus::Completed,
                label: "Completed",
                value: stats.completed_sessions,
            },
        ];
        Self {
            stats,
            status_breakdown,
            daily,
        }
    }

    pub fn total_sessions(&self) -> u64 {
        self.status_breakdown.iter().map(|s| s.value).sum()
    }
}

/// "/admin/dashboard". Both aggregate endpoints are fetched together; neither is shown
/// unless both succeed.
pub struct AdminDashboard<S: SkillMentorService> {
    service: S,
    state: ViewState<DashboardView>,
}

impl<S: SkillMentorService> AdminDashboard<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self) -> &ViewState<DashboardView> {
        self.state = match fetch_dashboard(&self.service).await {
            Ok(view) => ViewState::Ready(view),
            Err(err) => {
                error!(error = %err, "failed to fetch dashboard data");
                ViewState::Failed("Failed to fetch dashboard data.".into())
            }
        };
        &self.state
    }

    pub fn state(&self) -> &ViewState<DashboardView> {
        &self.state
    }
}

async fn fetch_dashboard<S: SkillMentorService>(service: &S) -> ServiceResult<DashboardView> {
    let (stats, daily) = tokio::try_join!(service.dashboard_stats(), service.daily_bookings())?;
    Ok(DashboardView::new(stats, daily))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Endpoint, InMemoryService};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn breakdown_and_daily_series() {
        let service = InMemoryService::new_with_sample();
        let day1 = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2030, 1, 2, 10, 0, 0).unwrap();
        service.insert_booking(1, 4, "Nimal", day1, BookingStatus::Pending);
        service.insert_booking(1, 4, "Sunil", day1, BookingStatus::Accepted);
        service.insert_booking(3, 5, "Nimal", day2, BookingStatus::Completed);

        let mut page = AdminDashboard::new(service);
        let view = page.load().await.ready().cloned().unwrap();
        assert_eq!(view.stats.total_mentors, 2);
        assert_eq!(view.stats.total_students, 2);
        assert_eq!(view.total_sessions(), 3);
        assert_eq!(view.status_breakdown[0].label, "Pending");
        assert_eq!(view.status_breakdown[0].value, 1);
        assert_eq!(view.daily.len(), 2);
        assert_eq!(view.daily[0].booking_count, 2);
    }

    #[tokio::test]
    async fn either_failure_hides_both() {
        for endpoint in [Endpoint::DashboardStats, Endpoint::DailyBookings] {
            let service = InMemoryService::new_with_sample();
            service.fail_on(endpoint);
            let mut page = AdminDashboard::new(service);
            assert!(
                matches!(page.load().await, ViewState::Failed(_)),
                "{endpoint:?} failure should fail the dashboard"
            );
        }
    }
}
