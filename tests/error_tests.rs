// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{http::StatusCode, response::IntoResponse};
use strava_mcp::error::AppError;

#[test]
fn test_is_strava_token_error_matches() {
    let err = AppError::StravaApi(AppError::STRAVA_TOKEN_ERROR.to_string());
    assert!(err.is_strava_token_error());
}

#[test]
fn test_is_strava_token_error_no_match() {
    let err = AppError::StravaApi("HTTP 400: invalid sport_type".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::StravaApi("Token refresh request failed: connection refused".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::StravaApi("Rate limit exceeded".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::Unauthorized(AppError::STRAVA_TOKEN_ERROR.to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::BadRequest("Bad Request".to_string());
    assert!(!err.is_strava_token_error());
}

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized("x".to_string()), StatusCode::UNAUTHORIZED),
        (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (AppError::StravaApi("x".to_string()), StatusCode::BAD_GATEWAY),
        (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
        (
            AppError::Internal(anyhow::anyhow!("x")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(err.into_response().status(), status);
    }
}

#[test]
fn test_internal_details_are_hidden() {
    let body = AppError::Internal(anyhow::anyhow!("db password in here")).to_body();
    assert_eq!(body.error, "internal_error");
    assert!(body.details.is_none());

    let body = AppError::Unauthorized(AppError::NOT_AUTHENTICATED.to_string()).to_body();
    assert_eq!(body.error, "unauthorized");
    assert_eq!(body.details.as_deref(), Some(AppError::NOT_AUTHENTICATED));
}
