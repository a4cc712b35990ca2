use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::debounce::{Debouncer, RequestSequence};
use crate::models::{BadgeVariant, BookingAction, BookingDetails, BookingQuery, BookingStatus};
use crate::notify::Toaster;
use crate::services::{ServiceError, SkillMentorService};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("booking {0} is not on the current page")]
    UnknownBooking(i64),
    #[error("cannot {} booking {id} while it is {status}", .action.label().to_lowercase())]
    ActionNotAllowed {
        id: i64,
        status: BookingStatus,
        action: BookingAction,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookingRow {
    pub booking: BookingDetails,
    pub badge: BadgeVariant,
    pub action: Option<BookingAction>,
}

/// Everything the bookings table renders.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueSnapshot {
    pub page: u32,
    pub total_pages: u32,
    pub search_input: String,
    pub search_term: String,
    pub rows: Vec<BookingRow>,
    pub loading: bool,
    pub can_previous: bool,
    pub can_next: bool,
}

#[derive(Debug, Default)]
struct QueueState {
    page: u32,
    total_pages: u32,
    search_input: String,
    search_term: String,
    rows: Vec<BookingDetails>,
    loading: bool,
}

impl QueueState {
    fn can_previous(&self) -> bool {
        self.page > 0
    }

    fn can_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Admin booking queue: paged, searchable, with approve/complete actions.
///
/// Responses are applied only if no newer list request was issued after them,
/// so a slow reply for an old search term never replaces fresher rows.
pub struct BookingQueue<S: SkillMentorService + Clone> {
    service: S,
    page_size: u32,
    state: Arc<Mutex<QueueState>>,
    debouncer: Debouncer,
    sequence: RequestSequence,
    toaster: Toaster,
}

impl<S: SkillMentorService + Clone> Clone for BookingQueue<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            page_size: self.page_size,
            state: Arc::clone(&self.state),
            debouncer: self.debouncer.clone(),
            sequence: self.sequence.clone(),
            toaster: self.toaster.clone(),
        }
    }
}

impl<S: SkillMentorService + Clone> BookingQueue<S> {
    pub fn new(service: S, page_size: u32, debounce: Duration, toaster: Toaster) -> Self {
        Self {
            service,
            page_size: page_size.max(1),
            state: Arc::new(Mutex::new(QueueState::default())),
            debouncer: Debouncer::new(debounce),
            sequence: RequestSequence::new(),
            toaster,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.lock();
        QueueSnapshot {
            page: state.page,
            total_pages: state.total_pages,
            search_input: state.search_input.clone(),
            search_term: state.search_term.clone(),
            rows: state
                .rows
                .iter()
                .map(|b| BookingRow {
                    booking: b.clone(),
                    badge: b.status.badge(),
                    action: b.status.available_action(),
                })
                .collect(),
            loading: state.loading,
            can_previous: state.can_previous(),
            can_next: state.can_next(),
        }
    }

    fn query(&self, state: &QueueState) -> BookingQuery {
        BookingQuery {
            page: state.page,
            size: self.page_size,
            search_term: state.search_term.clone(),
        }
    }

    /// Fetches the current page. Returns `false` if the reply was superseded and dropped.
    pub async fn refresh(&self) -> bool {
        let query = self.query(&self.lock());
        self.load(query).await
    }

    /// Fetches `query`; its page and term become the queue's cursor only once rows arrive,
    /// so a failed fetch leaves the cursor matching the rows still shown.
    async fn load(&self, query: BookingQuery) -> bool {
        let seq = self.sequence.next();
        self.lock().loading = true;

        let result = self.service.admin_bookings(&query).await;
        if !self.sequence.is_latest(seq) {
            debug!(seq, search_term = %query.search_term, "discarding stale bookings response");
            return false;
        }

        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(page) => {
                state.page = query.page;
                state.search_term = query.search_term;
                state.rows = page.content;
                state.total_pages = page.total_pages;
            }
            Err(err) => {
                error!(error = %err, page = query.page, "failed to fetch bookings");
                self.toaster.error("Error", "Failed to fetch bookings.");
            }
        }
        true
    }

    /// Search box input. Fetches only once the input has been quiet for the debounce delay;
    /// returns whether this call was the one that fetched.
    pub async fn search(&self, input: &str) -> bool {
        self.lock().search_input = input.to_string();
        let ticket = self.debouncer.schedule();
        if !ticket.settled().await {
            return false;
        }
        let query = BookingQuery {
            page: 0,
            size: self.page_size,
            search_term: input.trim().to_string(),
        };
        self.load(query).await
    }

    pub async fn next_page(&self) -> bool {
        let query = {
            let state = self.lock();
            if !state.can_next() {
                return false;
            }
            BookingQuery {
                page: state.page + 1,
                ..self.query(&state)
            }
        };
        self.load(query).await
    }

    pub async fn previous_page(&self) -> bool {
        let query = {
            let state = self.lock();
            if !state.can_previous() {
                return false;
            }
            BookingQuery {
                page: state.page - 1,
                ..self.query(&state)
            }
        };
        self.load(query).await
    }

    pub async fn approve(&self, booking_id: i64) -> Result<(), QueueError> {
        self.act(booking_id, BookingAction::Approve).await
    }

    pub async fn complete(&self, booking_id: i64) -> Result<(), QueueError> {
        self.act(booking_id, BookingAction::Complete).await
    }

    async fn act(&self, booking_id: i64, action: BookingAction) -> Result<(), QueueError> {
        let status = self
            .lock()
            .rows
            .iter()
            .find(|b| b.booking_id == booking_id)
            .map(|b| b.status)
            .ok_or(QueueError::UnknownBooking(booking_id))?;
        if status.available_action() != Some(action) {
            return Err(QueueError::ActionNotAllowed {
                id: booking_id,
                status,
                action,
            });
        }

        let result = match action {
            BookingAction::Approve => self.service.approve_booking(booking_id).await,
            BookingAction::Complete => self.service.complete_booking(booking_id).await,
        };
        match result {
            Ok(()) => {
                info!(booking_id, action = action.label(), "booking updated");
                self.toaster.success("Success", action.success_message());
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                error!(booking_id, error = %err, "booking action failed");
                self.toaster.error("Error", "Action failed.");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Endpoint, InMemoryService};
    use chrono::{TimeZone, Utc};

    fn seeded(count: usize) -> InMemoryService {
        let service = InMemoryService::new_with_sample();
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        for i in 0..count {
            service.insert_booking(1, 4, &format!("Student {i}"), at, BookingStatus::Pending);
        }
        service
    }

    fn queue(service: &InMemoryService) -> BookingQueue<InMemoryService> {
        BookingQueue::new(
            service.clone(),
            10,
            Duration::from_millis(500),
            Toaster::new(),
        )
    }

    #[tokio::test]
    async fn pagination_bounds() {
        let service = seeded(25);
        let queue = queue(&service);
        queue.refresh().await;

        let first = queue.snapshot();
        assert_eq!(first.total_pages, 3);
        assert!(!first.can_previous);
        assert!(first.can_next);
        assert!(!queue.previous_page().await);

        assert!(queue.next_page().await);
        assert!(queue.next_page().await);
        let last = queue.snapshot();
        assert_eq!(last.page, 2);
        assert_eq!(last.rows.len(), 5);
        assert!(last.can_previous);
        assert!(!last.can_next);
        assert!(!queue.next_page().await);
    }

    #[tokio::test]
    async fn empty_list_disables_both_buttons() {
        let service = seeded(0);
        let queue = queue(&service);
        queue.refresh().await;
        let snap = queue.snapshot();
        assert!(!snap.can_previous);
        assert!(!snap.can_next);
    }

    #[tokio::test]
    async fn completed_rows_offer_no_action() {
        let service = seeded(0);
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let done = service.insert_booking(1, 4, "Done", at, BookingStatus::Completed);
        let queue = queue(&service);
        queue.refresh().await;

        let row = &queue.snapshot().rows[0];
        assert_eq!(row.action, None);
        assert_eq!(row.badge, BadgeVariant::Default);
        service.clear_calls();
        assert!(matches!(
            queue.approve(done).await,
            Err(QueueError::ActionNotAllowed { .. })
        ));
        assert!(matches!(
            queue.complete(done).await,
            Err(QueueError::ActionNotAllowed { .. })
        ));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn pending_cannot_jump_to_completed() {
        let service = seeded(1);
        let queue = queue(&service);
        queue.refresh().await;
        let id = queue.snapshot().rows[0].booking.booking_id;
        assert!(matches!(
            queue.complete(id).await,
            Err(QueueError::ActionNotAllowed { .. })
        ));
        assert_eq!(service.call_count(Endpoint::CompleteBooking), 0);
    }

    #[tokio::test]
    async fn failed_action_toasts_and_keeps_rows() {
        let service = seeded(1);
        let toaster = Toaster::new();
        let queue = BookingQueue::new(service.clone(), 10, Duration::from_millis(500), toaster.clone());
        queue.refresh().await;
        let id = queue.snapshot().rows[0].booking.booking_id;

        service.fail_on(Endpoint::ApproveBooking);
        assert!(matches!(queue.approve(id).await, Err(QueueError::Service(_))));
        assert_eq!(toaster.last().unwrap().description, "Action failed.");
        assert_eq!(queue.snapshot().rows[0].booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn failed_fetch_toasts() {
        let service = seeded(1);
        service.fail_on(Endpoint::AdminBookings);
        let toaster = Toaster::new();
        let queue = BookingQueue::new(service, 10, Duration::from_millis(500), toaster.clone());
        queue.refresh().await;
        assert_eq!(toaster.last().unwrap().description, "Failed to fetch bookings.");
        assert!(!queue.snapshot().loading);
    }

    #[tokio::test]
    async fn failed_page_turn_keeps_the_cursor() {
        let service = seeded(15);
        let toaster = Toaster::new();
        let queue = BookingQueue::new(service.clone(), 10, Duration::ZERO, toaster.clone());
        queue.refresh().await;
        let before = queue.snapshot();

        service.fail_on(Endpoint::AdminBookings);
        queue.next_page().await;
        let after = queue.snapshot();
        assert_eq!(after.page, 0);
        assert!(after.can_next);
        assert_eq!(after.rows, before.rows);
        assert_eq!(toaster.last().unwrap().description, "Failed to fetch bookings.");

        service.recover(Endpoint::AdminBookings);
        assert!(queue.next_page().await);
        let retried = queue.snapshot();
        assert_eq!(retried.page, 1);
        assert_eq!(retried.rows.len(), 5);
    }

    #[tokio::test]
    async fn failed_search_keeps_the_applied_term() {
        let service = seeded(0);
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        service.insert_booking(1, 4, "Nimal", at, BookingStatus::Pending);
        service.insert_booking(1, 4, "Kasun", at, BookingStatus::Pending);
        let queue = BookingQueue::new(service.clone(), 10, Duration::ZERO, Toaster::new());
        queue.refresh().await;

        service.fail_on(Endpoint::AdminBookings);
        queue.search("Nimal").await;
        let snap = queue.snapshot();
        assert_eq!(snap.search_input, "Nimal");
        assert_eq!(snap.search_term, "");
        assert_eq!(snap.rows.len(), 2);

        service.recover(Endpoint::AdminBookings);
        queue.search("Nimal").await;
        let snap = queue.snapshot();
        assert_eq!(snap.search_term, "Nimal");
        assert_eq!(snap.rows.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_search_returns_to_first_page() {
        let service = seeded(25);
        let queue = queue(&service);
        queue.refresh().await;
        queue.next_page().await;
        assert_eq!(queue.snapshot().page, 1);

        assert!(queue.search("Student 1").await);
        let snap = queue.snapshot();
        assert_eq!(snap.page, 0);
        assert_eq!(snap.search_term, "Student 1");
    }
}
