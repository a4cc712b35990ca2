pub mod bookings;
pub mod classes;
pub mod dashboard;
pub mod mentors;

use thiserror::Error;

use crate::models::FileUpload;
use crate::router::{AdminRoute, Route};
use crate::services::{ServiceError, ServiceResult, SkillMentorService};
use crate::validation::{check_image, optional_text, FieldErrors};

/// Failure of an admin creation form.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("invalid input: {0}")]
    Validation(FieldErrors),
    #[error("image upload failed: {0}")]
    Upload(#[source] ServiceError),
    #[error("submission failed: {0}")]
    Submission(#[source] ServiceError),
}

/// Validates the picked image, if any. Must run before any network call.
pub(crate) fn check_optional_image(errors: &mut FieldErrors, images: &[FileUpload]) {
    if let Some(file) = images.first() {
        check_image(errors, "image", file);
    }
}

/// Toast copy for a rejected admin form.
pub(crate) fn validation_summary(errors: &FieldErrors) -> &'static str {
    if errors.len() == 1 && errors.get("image").is_some() {
        "Images must be JPEG, PNG or WEBP and 5MB or smaller."
    } else {
        "Please fill in all required fields correctly."
    }
}

/// Uploads the picked image if there is one; otherwise falls back to the typed URL.
pub(crate) async fn resolve_image_url<S: SkillMentorService>(
    service: &S,
    images: &[FileUpload],
    typed_url: &str,
) -> ServiceResult<Option<String>> {
    match images.first() {
        Some(file) => Ok(Some(service.upload_file(file).await?.url)),
        None => Ok(optional_text(typed_url)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminNavLink {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Side navigation of the admin panel, with the link for `current` marked active.
pub fn admin_menu(current: &Route) -> Vec<AdminNavLink> {
    let current = match current {
        Route::Admin(section) => Some(*section),
        _ => None,
    };
    [
        ("Manage Bookings", AdminRoute::Bookings),
        ("Dashboard", AdminRoute::Dashboard),
        ("Create Class", AdminRoute::CreateClass),
        ("Create Mentor", AdminRoute::CreateMentor),
    ]
    .into_iter()
    .map(|(label, section)| AdminNavLink {
        label,
        path: section.path(),
        active: current == Some(section),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_route_highlights_bookings() {
        let menu = admin_menu(&Route::parse("/admin"));
        let active: Vec<_> = menu.iter().filter(|l| l.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].label, "Manage Bookings");
    }

    #[test]
    fn non_admin_route_highlights_nothing() {
        assert!(admin_menu(&Route::Classes).iter().all(|l| !l.active));
    }
}
