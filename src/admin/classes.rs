use tracing::{error, info};

use super::{check_optional_image, resolve_image_url, validation_summary, FormError};
use crate::models::{CreateClassroomRequest, FileUpload};
use crate::notify::Toaster;
use crate::services::SkillMentorService;
use crate::validation::{required_text, FieldErrors};

#[derive(Clone, Debug, Default)]
pub struct ClassForm {
    pub name: String,
    pub image_url: String,
    pub image: Vec<FileUpload>,
}

impl ClassForm {
    fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name);
        check_optional_image(&mut errors, &self.image);
        errors.finish(name)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// "/admin/create-class".
pub struct ClassCreation<S: SkillMentorService> {
    service: S,
    toaster: Toaster,
}

impl<S: SkillMentorService> ClassCreation<S> {
    pub fn new(service: S, toaster: Toaster) -> Self {
        Self { service, toaster }
    }

    /// Submits the form; on success the form is cleared for the next entry.
    pub async fn submit(&self, form: &mut ClassForm) -> Result<CreateClassroomRequest, FormError> {
        let name = form.validate().map_err(|errors| {
            self.toaster.error("Error", validation_summary(&errors));
            FormError::Validation(errors)
        })?;

        let image_url = resolve_image_url(&self.service, &form.image, &form.image_url)
            .await
            .map_err(|err| {
                error!(error = %err, "classroom image upload failed");
                self.toaster.error("Error", "Failed to upload image.");
                FormError::Upload(err)
            })?;

        let request = CreateClassroomRequest { name, image_url };
        match self.service.create_classroom(&request).await {
            Ok(()) => {
                info!(name = %request.name, "classroom created");
                self.toaster.success("Success", "Classroom created successfully.");
                form.reset();
                Ok(request)
            }
            Err(err) => {
                error!(error = %err, "failed to create classroom");
                self.toaster.error("Error", "Failed to create classroom.");
                Err(FormError::Submission(err))
            }
        }
    }
}
