use axum::{
    body::to_bytes,
    http::{header, StatusCode},
    response::IntoResponse,
};
use library_seats::error::{ApiError, AppError};
use library_seats::seat_status::{admit, BookingStatus, SeatShiftStatus};
use library_seats::shifts::Shift;
use validator::Validate;

async fn body_of(err: AppError) -> (StatusCode, ApiError) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn invalid_shift_is_bad_request_with_label() {
    let err: AppError = "9 AM to 5 PM".parse::<Shift>().unwrap_err().into();
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "INVALID_SHIFT");
    assert!(body.message.contains("9 AM to 5 PM"));
}

#[tokio::test]
async fn invalid_status_is_bad_request() {
    let err: AppError = "Booked".parse::<BookingStatus>().unwrap_err().into();
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "INVALID_STATUS");
}

#[tokio::test]
async fn overlap_is_conflict() {
    let record: SeatShiftStatus = [(Shift::FullDay, BookingStatus::Confirmed)].into_iter().collect();
    let err: AppError = admit(&record, Shift::Night).unwrap_err().into();
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.code, "SHIFT_OVERLAP");
    assert!(body.message.contains("24*7"));
}

#[derive(Validate)]
struct Named {
    #[validate(length(min = 1))]
    name: String,
}

#[tokio::test]
async fn validation_failure_is_bad_request() {
    let err: AppError = Named { name: String::new() }.validate().unwrap_err().into();
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "VALIDATION_FAILED");
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let err = AppError::Database(sqlx::Error::PoolTimedOut);
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.message, "internal server error");

    let err = AppError::Cache(redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error")));
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.code, "INTERNAL");
}

#[tokio::test]
async fn unauthorized_asks_for_basic_auth() {
    let response = AppError::Unauthorized.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
}
