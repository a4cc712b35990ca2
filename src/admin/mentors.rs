use tracing::{error, info};

use super::{check_optional_image, resolve_image_url, validation_summary, FormError};
use crate::models::{CreateMentorRequest, FileUpload};
use crate::notify::Toaster;
use crate::services::{ServiceResult, SkillMentorService};
use crate::validation::{check_email, check_phone, required_text, FieldErrors};

/// Raw mentor form input, exactly as typed.
#[derive(Clone, Debug, Default)]
pub struct MentorForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub title: String,
    pub profession: String,
    pub qualification: String,
    pub session_fee: String,
    pub image_url: String,
    pub bio: String,
    pub image: Vec<FileUpload>,
    /// Values of the checked classroom boxes.
    pub classroom_ids: Vec<String>,
}

impl MentorForm {
    /// Parses the form into a typed request. `image_url` is left unset; the caller fills it
    /// after any upload.
    pub fn parse(&self, known_classrooms: &[i64]) -> Result<CreateMentorRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = required_text(&mut errors, "firstName", &self.first_name);
        let last_name = required_text(&mut errors, "lastName", &self.last_name);
        let email = required_text(&mut errors, "email", &self.email);
        check_email(&mut errors, "email", &email);
        let phone_number = self.phone_number.trim().to_string();
        check_phone(&mut errors, "phoneNumber", &phone_number);

        let fee_raw = required_text(&mut errors, "sessionFee", &self.session_fee);
        let session_fee = if fee_raw.is_empty() {
            0.0
        } else {
            match fee_raw.parse::<f64>() {
                Ok(fee) if fee.is_finite() && fee > 0.0 => fee,
                Ok(_) => {
                    errors.push("sessionFee", "must be greater than zero");
                    0.0
                }
                Err(_) => {
                    errors.push("sessionFee", "must be a number");
                    0.0
                }
            }
        };

        let mut classroom_ids = Vec::new();
        for raw in &self.classroom_ids {
            match raw.trim().parse::<i64>() {
                Ok(id) if known_classrooms.contains(&id) => {
                    if !classroom_ids.contains(&id) {
                        classroom_ids.push(id);
                    }
                }
                _ => errors.push("classroomIds", format!("unknown classroom '{raw}'")),
            }
        }
        if self.classroom_ids.is_empty() {
            errors.push("classroomIds", "select at least one class");
        }

        check_optional_image(&mut errors, &self.image);

        errors.finish(CreateMentorRequest {
            first_name,
            last_name,
            email,
            address: self.address.trim().to_string(),
            title: self.title.trim().to_string(),
            session_fee,
            profession: self.profession.trim().to_string(),
            bio: self.bio.trim().to_string(),
            phone_number,
            qualification: self.qualification.trim().to_string(),
            image_url: None,
            classroom_ids,
        })
    }

    /// Checks the box for `classroom_id`; already-checked boxes stay checked.
    pub fn select_classroom(&mut self, classroom_id: i64) {
        let value = classroom_id.to_string();
        if !self.classroom_ids.contains(&value) {
            self.classroom_ids.push(value);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassroomOption {
    pub id: i64,
    pub name: String,
}

/// "/admin/create-mentor": the checkbox set comes from the fetched classroom list.
pub struct MentorCreation<S: SkillMentorService> {
    service: S,
    toaster: Toaster,
    options: Vec<ClassroomOption>,
}

impl<S: SkillMentorService> MentorCreation<S> {
    pub fn new(service: S, toaster: Toaster) -> Self {
        Self {
            service,
            toaster,
            options: Vec::new(),
        }
    }

    pub async fn load_classrooms(&mut self) -> ServiceResult<&[ClassroomOption]> {
        let rooms = self.service.student_classrooms().await.map_err(|err| {
            error!(error = %err, "failed to fetch classrooms");
            err
        })?;
        self.options = rooms
            .into_iter()
            .map(|c| ClassroomOption {
                id: c.id,
                name: c.name,
            })
            .collect();
        Ok(&self.options)
    }

    pub async fn submit(&self, form: &mut MentorForm) -> Result<CreateMentorRequest, FormError> {
        let known: Vec<i64> = self.options.iter().map(|o| o.id).collect();
        let mut request = form.parse(&known).map_err(|errors| {
            self.toaster.error("Error", validation_summary(&errors));
            FormError::Validation(errors)
        })?;

        request.image_url = resolve_image_url(&self.service, &form.image, &form.image_url)
            .await
            .map_err(|err| {
                error!(error = %err, "mentor image upload failed");
                self.toaster.error("Error", "Failed to upload image.");
                FormError::Upload(err)
            })?;

        match self.service.create_mentor(&request).await {
            Ok(()) => {
                info!(email = %request.email, classrooms = ?request.classroom_ids, "mentor created");
                self.toaster.success("Success", "Mentor created successfully.");
                form.reset();
                Ok(request)
            }
            Err(err) => {
                error!(error = %err, "failed to create mentor");
                self.toaster.error("Error", "Failed to create mentor.");
                Err(FormError::Submission(err))
            }
        }
    }
}
