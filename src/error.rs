// src/error.rs
use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::summarize::SummaryError;

pub const MSG_MISSING_INDUSTRY: &str = "산업군을 입력해주세요.";
pub const MSG_NO_NEWS: &str = "수집된 뉴스가 없습니다.";
pub const MSG_SUMMARY_FAILED: &str = "요약 생성 중 오류가 발생했습니다.";
pub const MSG_INTERNAL: &str = "처리 중 오류가 발생했습니다.";

/// Outcome of a failed sensing request.
#[derive(Debug, Error)]
pub enum SenseError {
    /// Blank or missing industry; rejected before any network call.
    #[error("missing industry")]
    MissingIndustry,
    /// Neither source returned anything.
    #[error("no news found for {0}")]
    NoNews(String),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl SenseError {
    pub fn status(&self) -> StatusCode {
        match self {
            SenseError::MissingIndustry => StatusCode::BAD_REQUEST,
            SenseError::NoNews(_) => StatusCode::NOT_FOUND,
            SenseError::Summary(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            SenseError::MissingIndustry => MSG_MISSING_INDUSTRY.to_string(),
            SenseError::NoNews(_) => MSG_NO_NEWS.to_string(),
            SenseError::Summary(_) => MSG_SUMMARY_FAILED.to_string(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for SenseError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "sensing request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

/// Renders a panic caught anywhere below the router as `500 {error}`,
/// carrying the panic message when there is one.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(MSG_INTERNAL)
        .to_string();
    tracing::error!(panic = %message, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(SenseError::MissingIndustry.status(), StatusCode::BAD_REQUEST);
        assert_eq!(SenseError::NoNews("x".into()).status(), StatusCode::NOT_FOUND);
        let s = SenseError::from(SummaryError::Parse("eof".into()));
        assert_eq!(s.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(s.public_message(), MSG_SUMMARY_FAILED);
    }

    #[test]
    fn panic_payloads_become_500_with_message() {
        let r = panic_response(Box::new(String::from("provider exploded")));
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let r = panic_response(Box::new(42u8));
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
