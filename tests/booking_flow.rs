use chrono::{TimeZone, Utc};
use std::sync::Arc;

use skillmentor::booking::{BookingController, BookingDialog, BookingError, BookingForm};
use skillmentor::catalog::ClassesPage;
use skillmentor::clock::FixedClock;
use skillmentor::models::{BookingStatus, FileUpload};
use skillmentor::notify::{ToastVariant, Toaster};
use skillmentor::services::{Endpoint, InMemoryService};

fn controller(service: &InMemoryService, toaster: &Toaster) -> BookingController<InMemoryService> {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
    BookingController::new(service.clone(), Arc::new(FixedClock(now)), toaster.clone())
}

async fn open_dialog(service: &InMemoryService) -> BookingDialog {
    let mut page = ClassesPage::new(service.clone());
    page.load().await;
    page.schedule(1, 4).expect("Kamal Perera teaches A/L Physics")
}

fn slip() -> FileUpload {
    FileUpload::new("slip.png", "image/png", vec![7u8; 2 * 1024 * 1024])
}

#[tokio::test]
async fn schedule_then_book_creates_pending_session() {
    let service = InMemoryService::new_with_sample();
    let toaster = Toaster::new();
    let mut dialog = open_dialog(&service).await;
    assert_eq!(
        dialog.description(),
        "Book a session for A/L Physics with Kamal Perera."
    );

    let form = BookingForm {
        session_date_time: "2030-01-01T10:00".into(),
        payment_proof: vec![slip()],
    };
    let request = controller(&service, &toaster)
        .submit(&mut dialog, &form)
        .await
        .unwrap();

    assert_eq!(request.classroom_id, 1);
    assert_eq!(request.mentor_id, 4);
    assert_eq!(request.duration, 60);
    assert_eq!(request.session_date_time, "2030-01-01T10:00:00.000Z");
    assert!(request.bank_slip_url.ends_with("/slip.png"));
    assert!(!dialog.is_open());

    let toast = toaster.last().unwrap();
    assert_eq!(toast.title, "Success!");
    assert_eq!(toast.variant, ToastVariant::Default);

    let stored = service.stored_bookings();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, BookingStatus::Pending);
    assert_eq!(stored[0].bank_slip_url, request.bank_slip_url);
    assert_eq!(
        service.calls(),
        vec![
            Endpoint::StudentClassrooms,
            Endpoint::UploadFile,
            Endpoint::CreateBooking
        ]
    );
}

#[tokio::test]
async fn past_date_is_rejected_before_any_request() {
    let service = InMemoryService::new_with_sample();
    let toaster = Toaster::new();
    let mut dialog = open_dialog(&service).await;
    service.clear_calls();

    let form = BookingForm {
        session_date_time: "2020-01-01T10:00".into(),
        payment_proof: vec![slip()],
    };
    let result = controller(&service, &toaster).submit(&mut dialog, &form).await;

    match result {
        Err(BookingError::Validation(errors)) => {
            assert_eq!(errors.get("sessionDateTime"), Some("must be in the future"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(service.calls().is_empty());
    assert!(dialog.is_open());
    let toast = toaster.last().unwrap();
    assert_eq!(toast.title, "Missing Information");
    assert_eq!(toast.description, "Please choose a session time in the future.");
    assert!(!toast.description.contains("sessionDateTime"));
}

#[tokio::test]
async fn upload_failure_keeps_dialog_open() {
    let service = InMemoryService::new_with_sample();
    service.fail_on(Endpoint::UploadFile);
    let toaster = Toaster::new();
    let mut dialog = open_dialog(&service).await;

    let form = BookingForm {
        session_date_time: "2030-01-01T10:00".into(),
        payment_proof: vec![slip()],
    };
    let result = controller(&service, &toaster).submit(&mut dialog, &form).await;

    assert!(matches!(result, Err(BookingError::Upload(_))));
    assert!(dialog.is_open());
    assert!(!dialog.is_submitting());
    assert_eq!(toaster.last().unwrap().title, "Upload Failed");
    assert_eq!(service.call_count(Endpoint::CreateBooking), 0);
    assert!(service.stored_bookings().is_empty());
}

#[tokio::test]
async fn submission_failure_is_reported_separately_and_retry_succeeds() {
    let service = InMemoryService::new_with_sample();
    service.fail_on(Endpoint::CreateBooking);
    let toaster = Toaster::new();
    let controller = controller(&service, &toaster);
    let mut dialog = open_dialog(&service).await;

    let form = BookingForm {
        session_date_time: "2030-01-01T10:00".into(),
        payment_proof: vec![slip()],
    };
    let result = controller.submit(&mut dialog, &form).await;
    assert!(matches!(result, Err(BookingError::Submission(_))));
    assert!(dialog.is_open());
    let toast = toaster.last().unwrap();
    assert_eq!(toast.title, "Booking Failed");
    assert_eq!(toast.variant, ToastVariant::Destructive);

    service.recover(Endpoint::CreateBooking);
    controller.submit(&mut dialog, &form).await.unwrap();
    assert!(!dialog.is_open());
    assert_eq!(service.stored_bookings().len(), 1);
}

#[tokio::test]
async fn unsupported_slip_type_never_uploads() {
    let service = InMemoryService::new_with_sample();
    let toaster = Toaster::new();
    let mut dialog = open_dialog(&service).await;

    let form = BookingForm {
        session_date_time: "2030-01-01T10:00".into(),
        payment_proof: vec![FileUpload::new("slip.pdf", "application/pdf", vec![0; 10])],
    };
    let result = controller(&service, &toaster).submit(&mut dialog, &form).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
    assert_eq!(service.call_count(Endpoint::UploadFile), 0);
}
