use tracing::error;

use crate::booking::BookingDialog;
use crate::models::{Classroom, Mentor, MentorProfile, StudentSession};
use crate::services::{ServiceResult, SkillMentorService};

/// Render state of a fetched view.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Empty,
    Ready(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> ViewState<Vec<T>> {
    /// Background list loads: failures are logged, not shown as toasts.
    fn from_list(result: ServiceResult<Vec<T>>, what: &str) -> Self {
        match result {
            Ok(items) if items.is_empty() => ViewState::Empty,
            Ok(items) => ViewState::Ready(items),
            Err(err) => {
                error!(error = %err, "failed to fetch {what}");
                ViewState::Failed(format!("Failed to fetch {what}."))
            }
        }
    }
}

/// "/classes": every classroom with the mentors teaching it.
pub struct ClassesPage<S: SkillMentorService> {
    service: S,
    state: ViewState<Vec<Classroom>>,
}

impl<S: SkillMentorService> ClassesPage<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self) -> &ViewState<Vec<Classroom>> {
        self.state = ViewState::from_list(self.service.student_classrooms().await, "classes");
        &self.state
    }

    pub fn state(&self) -> &ViewState<Vec<Classroom>> {
        &self.state
    }

    /// "Schedule" on a mentor card: opens the booking dialog for that pair.
    pub fn schedule(&self, classroom_id: i64, mentor_id: i64) -> Option<BookingDialog> {
        let classroom = self.state.ready()?.iter().find(|c| c.id == classroom_id)?;
        let mentor = classroom
            .assigned_mentors()
            .iter()
            .find(|m| m.id == mentor_id)?;
        Some(BookingDialog::open_for(classroom.clone(), mentor.clone()))
    }
}

pub const NO_MENTORS_ASSIGNED: &str = "No mentors assigned yet.";

pub struct MentorDirectory<S: SkillMentorService> {
    service: S,
    state: ViewState<Vec<Mentor>>,
}

impl<S: SkillMentorService> MentorDirectory<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self) -> &ViewState<Vec<Mentor>> {
        self.state = ViewState::from_list(self.service.mentors().await, "mentors");
        &self.state
    }

    pub fn state(&self) -> &ViewState<Vec<Mentor>> {
        &self.state
    }
}

/// "/mentor/{id}".
pub struct MentorProfilePage<S: SkillMentorService> {
    service: S,
    mentor_id: i64,
    state: ViewState<MentorProfile>,
}

impl<S: SkillMentorService> MentorProfilePage<S> {
    pub fn new(service: S, mentor_id: i64) -> Self {
        Self {
            service,
            mentor_id,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self) -> &ViewState<MentorProfile> {
        self.state = match self.service.mentor_profile(self.mentor_id).await {
            Ok(profile) => ViewState::Ready(profile),
            Err(err) => {
                error!(mentor_id = self.mentor_id, error = %err, "failed to fetch mentor profile");
                ViewState::Failed("Failed to fetch mentor profile.".into())
            }
        };
        &self.state
    }

    pub fn state(&self) -> &ViewState<MentorProfile> {
        &self.state
    }
}

/// "/dashboard": the signed-in student's sessions.
pub struct StudentDashboardPage<S: SkillMentorService> {
    service: S,
    state: ViewState<Vec<StudentSession>>,
}

impl<S: SkillMentorService> StudentDashboardPage<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self) -> &ViewState<Vec<StudentSession>> {
        self.state = ViewState::from_list(self.service.student_dashboard().await, "dashboard");
        &self.state
    }

    pub fn state(&self) -> &ViewState<Vec<StudentSession>> {
        &self.state
    }
}
