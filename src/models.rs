use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------- Records returned by the backend ----------

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub mentors: Option<Vec<Mentor>>,
}

impl Classroom {
    pub fn assigned_mentors(&self) -> &[Mentor] {
        self.mentors.as_deref().unwrap_or(&[])
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mentor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub title: String,
    pub session_fee: f64,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub qualification: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub classrooms: Option<Vec<Classroom>>,
}

impl Mentor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Avatar fallback: first letter of each name part.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Completed,
}

impl BookingStatus {
    /// The single forward action an admin may take from this status.
    pub fn available_action(self) -> Option<BookingAction> {
        match self {
            BookingStatus::Pending => Some(BookingAction::Approve),
            BookingStatus::Accepted => Some(BookingAction::Complete),
            BookingStatus::Completed => None,
        }
    }

    pub fn badge(self) -> BadgeVariant {
        match self {
            BookingStatus::Pending => BadgeVariant::Destructive,
            BookingStatus::Accepted => BadgeVariant::Secondary,
            BookingStatus::Completed => BadgeVariant::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Accepted => "ACCEPTED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
}

impl BadgeVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeVariant::Default => "default",
            BadgeVariant::Secondary => "secondary",
            BadgeVariant::Destructive => "destructive",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BookingAction {
    Approve,
    Complete,
}

impl BookingAction {
    pub fn from_status(self) -> BookingStatus {
        match self {
            BookingAction::Approve => BookingStatus::Pending,
            BookingAction::Complete => BookingStatus::Accepted,
        }
    }

    pub fn to_status(self) -> BookingStatus {
        match self {
            BookingAction::Approve => BookingStatus::Accepted,
            BookingAction::Complete => BookingStatus::Completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingAction::Approve => "Approve",
            BookingAction::Complete => "Complete",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            BookingAction::Approve => "Booking approved.",
            BookingAction::Complete => "Booking marked as completed.",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub booking_id: i64,
    pub class_name: String,
    pub student_name: String,
    pub mentor_name: String,
    pub session_date: String,
    pub status: BookingStatus,
}

impl BookingDetails {
    pub fn session_day(&self) -> String {
        session_day_label(&self.session_date)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentSession {
    pub class_name: String,
    pub mentor_name: String,
    pub session_date: String,
    pub status: BookingStatus,
}

impl StudentSession {
    pub fn session_day(&self) -> String {
        session_day_label(&self.session_date)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MentorClass {
    pub name: String,
    pub student_count: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MentorProfile {
    pub mentor: Mentor,
    #[serde(default)]
    pub classes: Vec<MentorClass>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardStats {
    pub total_mentors: u64,
    pub total_students: u64,
    pub total_classrooms: u64,
    pub pending_sessions: u64,
    pub accepted_sessions: u64,
    pub completed_sessions: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBookings {
    pub date: String,
    pub booking_count: u64,
}

/// One page of a server-paginated list; `number` is zero-indexed.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct UploadedFile {
    pub url: String,
}

// ---------- Request payloads ----------

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassroomRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMentorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub title: String,
    pub session_fee: f64,
    pub profession: String,
    pub bio: String,
    pub phone_number: String,
    pub qualification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub classroom_ids: Vec<i64>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub classroom_id: i64,
    pub mentor_id: i64,
    /// RFC 3339, UTC, millisecond precision.
    pub session_date_time: String,
    pub duration: u32,
    pub bank_slip_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingQuery {
    pub page: u32,
    pub size: u32,
    pub search_term: String,
}

/// A file picked by the user, held in memory until uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Best-effort content type from the file extension.
    pub fn guess_content_type(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn session_day_label(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.date().to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_actions_only_move_forward() {
        assert_eq!(
            BookingStatus::Pending.available_action(),
            Some(BookingAction::Approve)
        );
        assert_eq!(
            BookingStatus::Accepted.available_action(),
            Some(BookingAction::Complete)
        );
        assert_eq!(BookingStatus::Completed.available_action(), None);
        assert_eq!(BookingAction::Approve.to_status(), BookingStatus::Accepted);
        assert_eq!(BookingAction::Complete.from_status(), BookingStatus::Accepted);
    }

    #[test]
    fn each_status_has_its_own_badge() {
        assert_eq!(BookingStatus::Pending.badge(), BadgeVariant::Destructive);
        assert_eq!(BookingStatus::Accepted.badge(), BadgeVariant::Secondary);
        assert_eq!(BookingStatus::Completed.badge(), BadgeVariant::Default);
        assert_eq!(BookingStatus::Pending.badge().as_str(), "destructive");
    }

    #[test]
    fn booking_details_decode_from_backend_shape() {
        let raw = json!({
            "bookingId": 7,
            "className": "A/L Physics",
            "studentName": "Nimal",
            "mentorName": "Kamal Perera",
            "sessionDate": "2030-01-01T10:00:00Z",
            "status": "PENDING"
        });
        let booking: BookingDetails = serde_json::from_value(raw).unwrap();
        assert_eq!(booking.booking_id, 7);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.session_day(), "2030-01-01");
    }

    #[test]
    fn booking_request_uses_camel_case() {
        let req = CreateBookingRequest {
            classroom_id: 1,
            mentor_id: 2,
            session_date_time: "2030-01-01T10:00:00.000Z".into(),
            duration: 60,
            bank_slip_url: "https://files/slip.png".into(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["classroomId"], 1);
        assert_eq!(value["bankSlipUrl"], "https://files/slip.png");
        assert_eq!(value["sessionDateTime"], "2030-01-01T10:00:00.000Z");
    }

    #[test]
    fn classroom_without_mentors_field() {
        let room: Classroom =
            serde_json::from_value(json!({"id": 3, "name": "Chemistry", "imageUrl": null}))
                .unwrap();
        assert!(room.assigned_mentors().is_empty());
    }

    #[test]
    fn initials_and_content_type() {
        let mentor: Mentor = serde_json::from_value(json!({
            "id": 1, "firstName": "Ada", "lastName": "Lovelace", "sessionFee": 2500.0
        }))
        .unwrap();
        assert_eq!(mentor.initials(), "AL");
        assert_eq!(FileUpload::guess_content_type("SLIP.JPG"), "image/jpeg");
        assert_eq!(FileUpload::guess_content_type("notes"), "application/octet-stream");
    }
}
