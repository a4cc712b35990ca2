use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::clock::Clock;
use crate::models::{Classroom, CreateBookingRequest, FileUpload, Mentor};
use crate::notify::Toaster;
use crate::services::{ServiceError, SkillMentorService};
use crate::validation::{check_image, FieldErrors};

pub const SESSION_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("no classroom or mentor selected")]
    NoSelection,
    #[error("missing information: {0}")]
    Validation(FieldErrors),
    #[error("payment slip upload failed: {0}")]
    Upload(#[source] ServiceError),
    #[error("booking submission failed: {0}")]
    Submission(#[source] ServiceError),
}

/// Raw input from the booking dialog.
#[derive(Clone, Debug, Default)]
pub struct BookingForm {
    /// `datetime-local` value, e.g. `2030-01-01T10:00`.
    pub session_date_time: String,
    /// Files picked for the payment slip; the first one is used.
    pub payment_proof: Vec<FileUpload>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedBooking {
    pub session_start: DateTime<Utc>,
    pub payment_proof: FileUpload,
}

impl BookingForm {
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<ValidatedBooking, FieldErrors> {
        let mut errors = FieldErrors::new();

        let session_start = if self.session_date_time.trim().is_empty() {
            errors.push("sessionDateTime", "is required");
            None
        } else {
            match parse_local_date_time(&self.session_date_time, offset) {
                Some(start) if start > now => Some(start),
                Some(_) => {
                    errors.push("sessionDateTime", "must be in the future");
                    None
                }
                None => {
                    errors.push("sessionDateTime", "is not a valid date and time");
                    None
                }
            }
        };

        let proof = self.payment_proof.first();
        match proof {
            Some(file) => check_image(&mut errors, "bankSlip", file),
            None => errors.push("bankSlip", "is required"),
        }

        match (session_start, proof) {
            (Some(session_start), Some(file)) if errors.is_empty() => Ok(ValidatedBooking {
                session_start,
                payment_proof: file.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Reads a `datetime-local` value (optionally with seconds, or a full RFC 3339 stamp).
pub fn parse_local_date_time(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn iso_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// State of the "Schedule Session" dialog.
#[derive(Clone, Debug, Default)]
pub struct BookingDialog {
    open: bool,
    submitting: bool,
    classroom: Option<Classroom>,
    mentor: Option<Mentor>,
}

impl BookingDialog {
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn open_for(classroom: Classroom, mentor: Mentor) -> Self {
        Self {
            open: true,
            submitting: false,
            classroom: Some(classroom),
            mentor: Some(mentor),
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.submitting = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn classroom(&self) -> Option<&Classroom> {
        self.classroom.as_ref()
    }

    pub fn mentor(&self) -> Option<&Mentor> {
        self.mentor.as_ref()
    }

    pub fn description(&self) -> String {
        format!(
            "Book a session for {} with {}.",
            self.classroom.as_ref().map(|c| c.name.as_str()).unwrap_or(""),
            self.mentor.as_ref().map(Mentor::full_name).unwrap_or_default()
        )
    }

    pub fn submit_label(&self) -> &'static str {
        if self.submitting {
            "Booking..."
        } else {
            "Confirm Booking"
        }
    }
}

/// Toast copy for a rejected form; the field keys stay in `FieldErrors`.
fn missing_information(errors: &FieldErrors) -> &'static str {
    let date = errors.get("sessionDateTime");
    let slip = errors.get("bankSlip");
    match (date, slip) {
        (Some("is required"), _) | (_, Some("is required")) => {
            "Please select a date and upload the payment slip."
        }
        (Some("must be in the future"), _) => "Please choose a session time in the future.",
        (Some(_), _) => "Please enter a valid date and time.",
        (None, Some(_)) => "The payment slip must be a JPEG, PNG or WEBP image of 5MB or less.",
        (None, None) => "Please select a date and upload the payment slip.",
    }
}

/// Validate, upload the slip, then create the booking.
pub struct BookingController<S: SkillMentorService> {
    service: S,
    clock: Arc<dyn Clock>,
    local_offset: FixedOffset,
    toaster: Toaster,
}

impl<S: SkillMentorService> BookingController<S> {
    pub fn new(service: S, clock: Arc<dyn Clock>, toaster: Toaster) -> Self {
        Self {
            service,
            clock,
            local_offset: Utc.fix(),
            toaster,
        }
    }

    pub fn with_local_offset(mut self, offset: FixedOffset) -> Self {
        self.local_offset = offset;
        self
    }

    pub async fn submit(
        &self,
        dialog: &mut BookingDialog,
        form: &BookingForm,
    ) -> Result<CreateBookingRequest, BookingError> {
        let (Some(classroom_id), Some(mentor_id)) = (
            dialog.classroom().map(|c| c.id),
            dialog.mentor().map(|m| m.id),
        ) else {
            self.toaster
                .error("Missing Information", "Please select a class and a mentor.");
            return Err(BookingError::NoSelection);
        };

        let validated = match form.validate(self.clock.now(), self.local_offset) {
            Ok(validated) => validated,
            Err(errors) => {
                self.toaster
                    .error("Missing Information", missing_information(&errors));
                return Err(BookingError::Validation(errors));
            }
        };

        dialog.submitting = true;
        let result = self
            .upload_and_create(classroom_id, mentor_id, validated)
            .await;
        dialog.submitting = false;

        match result {
            Ok(request) => {
                info!(classroom_id, mentor_id, "booking created");
                self.toaster.success(
                    "Success!",
                    "Your session has been booked and is pending approval.",
                );
                dialog.close();
                Ok(request)
            }
            Err(err) => {
                error!(error = %err, "booking failed");
                match &err {
                    BookingError::Upload(_) => self.toaster.error(
                        "Upload Failed",
                        "Could not upload the payment slip. Please try again.",
                    ),
                    _ => self.toaster.error(
                        "Booking Failed",
                        "Could not create the booking. Please try again.",
                    ),
                }
                Err(err)
            }
        }
    }

    async fn upload_and_create(
        &self,
        classroom_id: i64,
        mentor_id: i64,
        validated: ValidatedBooking,
    ) -> Result<CreateBookingRequest, BookingError> {
        let uploaded = self
            .service
            .upload_file(&validated.payment_proof)
            .await
            .map_err(BookingError::Upload)?;

        let request = CreateBookingRequest {
            classroom_id,
            mentor_id,
            session_date_time: iso_timestamp(validated.session_start),
            duration: SESSION_DURATION_MINUTES,
            bank_slip_url: uploaded.url,
        };
        self.service
            .create_booking(&request)
            .await
            .map_err(BookingError::Submission)?;
        Ok(request)
    }
}
