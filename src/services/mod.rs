use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    AdminDashboardStats, BookingAction, BookingDetails, BookingQuery, BookingStatus, Classroom,
    CreateBookingRequest, CreateClassroomRequest, CreateMentorRequest, DailyBookings, FileUpload,
    Mentor, MentorClass, MentorProfile, Page, StudentSession, UploadedFile,
};

pub mod http;

pub use http::HttpService;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Every backend call the client makes. One method per REST endpoint.
#[async_trait]
pub trait SkillMentorService: Send + Sync {
    async fn create_classroom(&self, request: &CreateClassroomRequest) -> ServiceResult<()>;
    async fn create_mentor(&self, request: &CreateMentorRequest) -> ServiceResult<()>;
    async fn admin_bookings(&self, query: &BookingQuery) -> ServiceResult<Page<BookingDetails>>;
    async fn approve_booking(&self, booking_id: i64) -> ServiceResult<()>;
    async fn complete_booking(&self, booking_id: i64) -> ServiceResult<()>;
    async fn dashboard_stats(&self) -> ServiceResult<AdminDashboardStats>;
    async fn daily_bookings(&self) -> ServiceResult<Vec<DailyBookings>>;
    async fn student_dashboard(&self) -> ServiceResult<Vec<StudentSession>>;
    async fn create_booking(&self, request: &CreateBookingRequest) -> ServiceResult<()>;
    async fn student_classrooms(&self) -> ServiceResult<Vec<Classroom>>;
    async fn mentors(&self) -> ServiceResult<Vec<Mentor>>;
    async fn mentor_profile(&self, mentor_id: i64) -> ServiceResult<MentorProfile>;
    async fn upload_file(&self, file: &FileUpload) -> ServiceResult<UploadedFile>;
}

#[async_trait]
impl<T: SkillMentorService + ?Sized> SkillMentorService for Arc<T> {
    async fn create_classroom(&self, request: &CreateClassroomRequest) -> ServiceResult<()> {
        (**self).create_classroom(request).await
    }
    async fn create_mentor(&self, request: &CreateMentorRequest) -> ServiceResult<()> {
        (**self).create_mentor(request).await
    }
    async fn admin_bookings(&self, query: &BookingQuery) -> ServiceResult<Page<BookingDetails>> {
        (**self).admin_bookings(query).await
    }
    async fn approve_booking(&self, booking_id: i64) -> ServiceResult<()> {
        (**self).approve_booking(booking_id).await
    }
    async fn complete_booking(&self, booking_id: i64) -> ServiceResult<()> {
        (**self).complete_booking(booking_id).await
    }
    async fn dashboard_stats(&self) -> ServiceResult<AdminDashboardStats> {
        (**self).dashboard_stats().await
    }
    async fn daily_bookings(&self) -> ServiceResult<Vec<DailyBookings>> {
        (**self).daily_bookings().await
    }
    async fn student_dashboard(&self) -> ServiceResult<Vec<StudentSession>> {
        (**self).student_dashboard().await
    }
    async fn create_booking(&self, request: &CreateBookingRequest) -> ServiceResult<()> {
        (**self).create_booking(request).await
    }
    async fn student_classrooms(&self) -> ServiceResult<Vec<Classroom>> {
        (**self).student_classrooms().await
    }
    async fn mentors(&self) -> ServiceResult<Vec<Mentor>> {
        (**self).mentors().await
    }
    async fn mentor_profile(&self, mentor_id: i64) -> ServiceResult<MentorProfile> {
        (**self).mentor_profile(mentor_id).await
    }
    async fn upload_file(&self, file: &FileUpload) -> ServiceResult<UploadedFile> {
        (**self).upload_file(file).await
    }
}

// ---------- In-memory backend ----------

/// Endpoints of the in-memory backend, used for call logs and fault injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CreateClassroom,
    CreateMentor,
    AdminBookings,
    ApproveBooking,
    CompleteBooking,
    DashboardStats,
    DailyBookings,
    StudentDashboard,
    CreateBooking,
    StudentClassrooms,
    Mentors,
    MentorProfile,
    UploadFile,
}

#[derive(Clone, Debug)]
pub struct StoredBooking {
    pub id: i64,
    pub classroom_id: i64,
    pub mentor_id: i64,
    pub student_name: String,
    pub session_date: DateTime<Utc>,
    pub duration: u32,
    pub bank_slip_url: String,
    pub status: BookingStatus,
}

#[derive(Default)]
struct InMemoryState {
    classrooms: BTreeMap<i64, Classroom>,
    mentors: BTreeMap<i64, Mentor>,
    assignments: BTreeMap<i64, HashSet<i64>>,
    bookings: BTreeMap<i64, StoredBooking>,
    students: HashSet<String>,
    current_student: String,
    next_id: i64,
    calls: Vec<Endpoint>,
    failures: HashSet<Endpoint>,
    search_latency: HashMap<String, Duration>,
}

impl InMemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn details(&self, booking: &StoredBooking) -> BookingDetails {
        BookingDetails {
            booking_id: booking.id,
            class_name: self
                .classrooms
                .get(&booking.classroom_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            student_name: booking.student_name.clone(),
            mentor_name: self
                .mentors
                .get(&booking.mentor_id)
                .map(Mentor::full_name)
                .unwrap_or_default(),
            session_date: booking.session_date.to_rfc3339(),
            status: booking.status,
        }
    }

    fn classroom_with_mentors(&self, classroom: &Classroom) -> Classroom {
        let mentors = self
            .assignments
            .iter()
            .filter(|(_, rooms)| rooms.contains(&classroom.id))
            .filter_map(|(mentor_id, _)| self.mentors.get(mentor_id).cloned())
            .collect();
        Classroom {
            mentors: Some(mentors),
            ..classroom.clone()
        }
    }
}

/// Backend double holding its records in memory. Enforces the same status
/// progression the real backend does and records each call it receives.
#[derive(Clone)]
pub struct InMemoryService {
    state: Arc<Mutex<InMemoryState>>,
}

impl Default for InMemoryService {
    fn default() -> Self {
        let state = InMemoryState {
            current_student: "Student".into(),
            ..InMemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

impl InMemoryService {
    pub fn new_with_sample() -> Self {
        let service = Self::default();
        {
            let mut state = service.lock();
            for name in ["A/L Physics", "A/L Chemistry", "Spoken English"] {
                let id = state.next_id();
                state.classrooms.insert(
                    id,
                    Classroom {
                        id,
                        name: name.into(),
                        image_url: None,
                        mentors: None,
                    },
                );
            }
            let mentor_id = state.next_id();
            state.mentors.insert(
                mentor_id,
                sample_mentor(mentor_id, "Kamal", "Perera", 2500.0),
            );
            state.assignments.insert(mentor_id, HashSet::from([1, 2]));
            let mentor_id = state.next_id();
            state.mentors.insert(
                mentor_id,
                sample_mentor(mentor_id, "Ayesha", "Fernando", 3000.0),
            );
            state.assignments.insert(mentor_id, HashSet::from([3]));
        }
        service
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, endpoint: Endpoint) -> ServiceResult<()> {
        let mut state = self.lock();
        state.calls.push(endpoint);
        if state.failures.contains(&endpoint) {
            return Err(ServiceError::Status {
                status: 500,
                body: format!("{endpoint:?} unavailable"),
            });
        }
        Ok(())
    }

    pub fn set_current_student(&self, name: &str) {
        let mut state = self.lock();
        state.current_student = name.to_string();
        state.students.insert(name.to_string());
    }

    pub fn fail_on(&self, endpoint: Endpoint) {
        self.lock().failures.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    /// Delays list responses for one search term, to exercise out-of-order replies.
    pub fn delay_search(&self, term: &str, delay: Duration) {
        self.lock().search_latency.insert(term.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.iter().filter(|c| **c == endpoint).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn stored_bookings(&self) -> Vec<StoredBooking> {
        self.lock().bookings.values().cloned().collect()
    }

    pub fn booking_status(&self, booking_id: i64) -> Option<BookingStatus> {
        self.lock().bookings.get(&booking_id).map(|b| b.status)
    }

    /// Seeds a booking directly, bypassing validation. Returns its id.
    pub fn insert_booking(
        &self,
        classroom_id: i64,
        mentor_id: i64,
        student_name: &str,
        session_date: DateTime<Utc>,
        status: BookingStatus,
    ) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.students.insert(student_name.to_string());
        state.bookings.insert(
            id,
            StoredBooking {
                id,
                classroom_id,
                mentor_id,
                student_name: student_name.to_string(),
                session_date,
                duration: 60,
                bank_slip_url: String::new(),
                status,
            },
        );
        id
    }

    pub fn insert_booking_with_id(
        &self,
        id: i64,
        classroom_id: i64,
        mentor_id: i64,
        student_name: &str,
        session_date: DateTime<Utc>,
        status: BookingStatus,
    ) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(id);
        state.students.insert(student_name.to_string());
        state.bookings.insert(
            id,
            StoredBooking {
                id,
                classroom_id,
                mentor_id,
                student_name: student_name.to_string(),
                session_date,
                duration: 60,
                bank_slip_url: String::new(),
                status,
            },
        );
    }

    fn transition(&self, booking_id: i64, action: BookingAction) -> ServiceResult<()> {
        let (from, to) = (action.from_status(), action.to_status());
        let mut state = self.lock();
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| ServiceError::NotFound(format!("booking {booking_id}")))?;
        if booking.status != from {
            return Err(ServiceError::Conflict(format!(
                "booking {booking_id} is {}, expected {from}",
                booking.status
            )));
        }
        booking.status = to;
        Ok(())
    }
}

fn sample_mentor(id: i64, first: &str, last: &str, fee: f64) -> Mentor {
    Mentor {
        id,
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}@skillmentor.test", first.to_lowercase()),
        address: "Colombo".into(),
        title: "Senior Lecturer".into(),
        session_fee: fee,
        profession: "Teacher".into(),
        bio: format!("{first} has been teaching for ten years."),
        phone_number: "+94 77 123 4567".into(),
        qualification: "BSc".into(),
        image_url: None,
        classrooms: None,
    }
}

#[async_trait]
impl SkillMentorService for InMemoryService {
    async fn create_classroom(&self, request: &CreateClassroomRequest) -> ServiceResult<()> {
        self.enter(Endpoint::CreateClassroom)?;
        if request.name.trim().is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }
        let mut state = self.lock();
        let id = state.next_id();
        state.classrooms.insert(
            id,
            Classroom {
                id,
                name: request.name.clone(),
                image_url: request.image_url.clone(),
                mentors: None,
            },
        );
        Ok(())
    }

    async fn create_mentor(&self, request: &CreateMentorRequest) -> ServiceResult<()> {
        self.enter(Endpoint::CreateMentor)?;
        let mut state = self.lock();
        if request.classroom_ids.is_empty() {
            return Err(ServiceError::Validation("classroomIds must not be empty".into()));
        }
        if let Some(missing) = request
            .classroom_ids
            .iter()
            .find(|id| !state.classrooms.contains_key(id))
        {
            return Err(ServiceError::NotFound(format!("classroom {missing}")));
        }
        let id = state.next_id();
        state.mentors.insert(
            id,
            Mentor {
                id,
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                email: request.email.clone(),
                address: request.address.clone(),
                title: request.title.clone(),
                session_fee: request.session_fee,
                profession: request.profession.clone(),
                bio: request.bio.clone(),
                phone_number: request.phone_number.clone(),
                qualification: request.qualification.clone(),
                image_url: request.image_url.clone(),
                classrooms: None,
            },
        );
        state
            .assignments
            .insert(id, request.classroom_ids.iter().copied().collect());
        Ok(())
    }

    async fn admin_bookings(&self, query: &BookingQuery) -> ServiceResult<Page<BookingDetails>> {
        self.enter(Endpoint::AdminBookings)?;
        let delay = self.lock().search_latency.get(&query.search_term).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        let needle = query.search_term.trim().to_lowercase();
        let matching: Vec<BookingDetails> = state
            .bookings
            .values()
            .map(|b| state.details(b))
            .filter(|d| {
                needle.is_empty()
                    || d.student_name.to_lowercase().contains(&needle)
                    || d.class_name.to_lowercase().contains(&needle)
                    || d.mentor_name.to_lowercase().contains(&needle)
            })
            .collect();

        let size = query.size.max(1);
        let total_elements = matching.len() as u64;
        let total_pages = matching.len().div_ceil(size as usize) as u32;
        let content = matching
            .into_iter()
            .skip((query.page as usize).saturating_mul(size as usize))
            .take(size as usize)
            .collect();
        Ok(Page {
            content,
            total_pages,
            total_elements,
            number: query.page,
            size,
        })
    }

    async fn approve_booking(&self, booking_id: i64) -> ServiceResult<()> {
        self.enter(Endpoint::ApproveBooking)?;
        self.transition(booking_id, BookingAction::Approve)
    }

    async fn complete_booking(&self, booking_id: i64) -> ServiceResult<()> {
        self.enter(Endpoint::CompleteBooking)?;
        self.transition(booking_id, BookingAction::Complete)
    }

    async fn dashboard_stats(&self) -> ServiceResult<AdminDashboardStats> {
        self.enter(Endpoint::DashboardStats)?;
        let state = self.lock();
        let count = |status: BookingStatus| {
            state
                .bookings
                .values()
                .filter(|b| b.status == status)
                .count() as u64
        };
        Ok(AdminDashboardStats {
            total_mentors: state.mentors.len() as u64,
            total_students: state.students.len() as u64,
            total_classrooms: state.classrooms.len() as u64,
            pending_sessions: count(BookingStatus::Pending),
            accepted_sessions: count(BookingStatus::Accepted),
            completed_sessions: count(BookingStatus::Completed),
        })
    }

    async fn daily_bookings(&self) -> ServiceResult<Vec<DailyBookings>> {
        self.enter(Endpoint::DailyBookings)?;
        let state = self.lock();
        let mut per_day: BTreeMap<String, u64> = BTreeMap::new();
        for booking in state.bookings.values() {
            *per_day
                .entry(booking.session_date.date_naive().to_string())
                .or_default() += 1;
        }
        Ok(per_day
            .into_iter()
            .map(|(date, booking_count)| DailyBookings {
                date,
                booking_count,
            })
            .collect())
    }

    async fn student_dashboard(&self) -> ServiceResult<Vec<StudentSession>> {
        self.enter(Endpoint::StudentDashboard)?;
        let state = self.lock();
        Ok(state
            .bookings
            .values()
            .filter(|b| b.student_name == state.current_student)
            .map(|b| {
                let details = state.details(b);
                StudentSession {
                    class_name: details.class_name,
                    mentor_name: details.mentor_name,
                    session_date: details.session_date,
                    status: details.status,
                }
            })
            .collect())
    }

    async fn create_booking(&self, request: &CreateBookingRequest) -> ServiceResult<()> {
        self.enter(Endpoint::CreateBooking)?;
        let session_date = DateTime::parse_from_rfc3339(&request.session_date_time)
            .map_err(|err| ServiceError::Validation(format!("sessionDateTime: {err}")))?
            .with_timezone(&Utc);
        let mut state = self.lock();
        if !state.classrooms.contains_key(&request.classroom_id) {
            return Err(ServiceError::NotFound(format!(
                "classroom {}",
                request.classroom_id
            )));
        }
        if !state.mentors.contains_key(&request.mentor_id) {
            return Err(ServiceError::NotFound(format!("mentor {}", request.mentor_id)));
        }
        let id = state.next_id();
        let student_name = state.current_student.clone();
        state.students.insert(student_name.clone());
        state.bookings.insert(
            id,
            StoredBooking {
                id,
                classroom_id: request.classroom_id,
                mentor_id: request.mentor_id,
                student_name,
                session_date,
                duration: request.duration,
                bank_slip_url: request.bank_slip_url.clone(),
                status: BookingStatus::Pending,
            },
        );
        Ok(())
    }

    async fn student_classrooms(&self) -> ServiceResult<Vec<Classroom>> {
        self.enter(Endpoint::StudentClassrooms)?;
        let state = self.lock();
        Ok(state
            .classrooms
            .values()
            .map(|c| state.classroom_with_mentors(c))
            .collect())
    }

    async fn mentors(&self) -> ServiceResult<Vec<Mentor>> {
        self.enter(Endpoint::Mentors)?;
        Ok(self.lock().mentors.values().cloned().collect())
    }

    async fn mentor_profile(&self, mentor_id: i64) -> ServiceResult<MentorProfile> {
        self.enter(Endpoint::MentorProfile)?;
        let state = self.lock();
        let mentor = state
            .mentors
            .get(&mentor_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("mentor {mentor_id}")))?;
        let rooms = state.assignments.get(&mentor_id).cloned().unwrap_or_default();
        let classes = state
            .classrooms
            .values()
            .filter(|c| rooms.contains(&c.id))
            .map(|c| MentorClass {
                name: c.name.clone(),
                student_count: state
                    .bookings
                    .values()
                    .filter(|b| b.mentor_id == mentor_id && b.classroom_id == c.id)
                    .map(|b| b.student_name.as_str())
                    .collect::<HashSet<_>>()
                    .len() as u32,
            })
            .collect();
        Ok(MentorProfile { mentor, classes })
    }

    async fn upload_file(&self, file: &FileUpload) -> ServiceResult<UploadedFile> {
        self.enter(Endpoint::UploadFile)?;
        let id = self.lock().next_id();
        let url = format!("https://files.skillmentor.test/{id}/{}", file.file_name);
        Ok(UploadedFile { url })
    }
}
