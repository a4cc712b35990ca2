use async_trait::async_trait;
use reqwest::{multipart, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ServiceError, ServiceResult, SkillMentorService};
use crate::auth::TokenProvider;
use crate::models::{
    AdminDashboardStats, BookingDetails, BookingQuery, Classroom, CreateBookingRequest,
    CreateClassroomRequest, CreateMentorRequest, DailyBookings, FileUpload, Mentor, MentorProfile,
    Page, StudentSession, UploadedFile,
};

/// REST client for the SkillMentor backend. The token provider is consulted on every request.
pub struct HttpService<P: TokenProvider> {
    client: Client,
    base_url: String,
    tokens: Arc<P>,
}

impl<P: TokenProvider> Clone for HttpService<P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<P: TokenProvider> HttpService<P> {
    pub fn new(base_url: &str, tokens: P, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: Arc::new(tokens),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = self.tokens.token().await {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> ServiceResult<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!(status = status.as_u16(), url = %resp.url(), "response received");
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized,
            StatusCode::NOT_FOUND => ServiceError::NotFound(body),
            StatusCode::CONFLICT => ServiceError::Conflict(body),
            StatusCode::BAD_REQUEST => ServiceError::Validation(body),
            _ => ServiceError::Status {
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<T> {
        let req = self.request(Method::GET, path).await;
        Ok(self.send(req).await?.json::<T>().await?)
    }
}

#[async_trait]
impl<P: TokenProvider + 'static> SkillMentorService for HttpService<P> {
    async fn create_classroom(&self, request: &CreateClassroomRequest) -> ServiceResult<()> {
        let req = self.request(Method::POST, "/admin/classrooms").await.json(request);
        self.send(req).await.map(drop)
    }

    async fn create_mentor(&self, request: &CreateMentorRequest) -> ServiceResult<()> {
        let req = self.request(Method::POST, "/admin/mentors").await.json(request);
        self.send(req).await.map(drop)
    }

    async fn admin_bookings(&self, query: &BookingQuery) -> ServiceResult<Page<BookingDetails>> {
        let req = self.request(Method::GET, "/admin/bookings").await.query(&[
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
            ("searchTerm", query.search_term.clone()),
        ]);
        Ok(self.send(req).await?.json().await?)
    }

    async fn approve_booking(&self, booking_id: i64) -> ServiceResult<()> {
        let path = format!("/admin/bookings/{booking_id}/approve");
        let req = self.request(Method::PUT, &path).await;
        self.send(req).await.map(drop)
    }

    async fn complete_booking(&self, booking_id: i64) -> ServiceResult<()> {
        let path = format!("/admin/bookings/{booking_id}/complete");
        let req = self.request(Method::PUT, &path).await;
        self.send(req).await.map(drop)
    }

    async fn dashboard_stats(&self) -> ServiceResult<AdminDashboardStats> {
        self.get_json("/admin/dashboard/stats").await
    }

    async fn daily_bookings(&self) -> ServiceResult<Vec<DailyBookings>> {
        self.get_json("/admin/dashboard/daily-bookings").await
    }

    async fn student_dashboard(&self) -> ServiceResult<Vec<StudentSession>> {
        self.get_json("/student/dashboard").await
    }

    async fn create_booking(&self, request: &CreateBookingRequest) -> ServiceResult<()> {
        let req = self.request(Method::POST, "/student/bookings").await.json(request);
        self.send(req).await.map(drop)
    }

    async fn student_classrooms(&self) -> ServiceResult<Vec<Classroom>> {
        self.get_json("/student/classrooms").await
    }

    async fn mentors(&self) -> ServiceResult<Vec<Mentor>> {
        self.get_json("/mentors").await
    }

    async fn mentor_profile(&self, mentor_id: i64) -> ServiceResult<MentorProfile> {
        self.get_json(&format!("/mentors/{mentor_id}")).await
    }

    async fn upload_file(&self, file: &FileUpload) -> ServiceResult<UploadedFile> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("file", part);
        let req = self.request(Method::POST, "/files/upload").await.multipart(form);
        Ok(self.send(req).await?.json().await?)
    }
}
