use crate::models::FileUpload;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field-level validation failures, in the order the fields were checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Hands back `value` only when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

pub fn required_text(errors: &mut FieldErrors, field: &'static str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "is required");
    }
    trimmed.to_string()
}

pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn check_email(errors: &mut FieldErrors, field: &'static str, value: &str) {
    lazy_static! {
        static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    if !value.is_empty() && !EMAIL.is_match(value) {
        errors.push(field, "must be a valid email address");
    }
}

pub fn check_phone(errors: &mut FieldErrors, field: &'static str, value: &str) {
    lazy_static! {
        static ref PHONE: Regex = Regex::new(r"^\+?[0-9][0-9 ()-]{5,18}[0-9]$").unwrap();
    }
    if !value.is_empty() && !PHONE.is_match(value) {
        errors.push(field, "must be a valid phone number");
    }
}

/// Image uploads: accepted type and at most `MAX_UPLOAD_BYTES`.
pub fn check_image(errors: &mut FieldErrors, field: &'static str, file: &FileUpload) {
    let content_type = file.content_type.trim().to_ascii_lowercase();
    if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
        errors.push(field, "must be a JPEG, PNG or WEBP image");
    }
    if file.size() > MAX_UPLOAD_BYTES {
        errors.push(field, "must be 5MB or smaller");
    }
}
