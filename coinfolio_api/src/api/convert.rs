use actix_web::{HttpResponse, Responder};
use log::{error, warn};

use crate::api::models::ErrorResponse;
use crate::error::ApiError;

pub trait ToResponse {
    type Output: Responder;
    fn to_response(&self) -> Self::Output;
}

impl ToResponse for ApiError {
    type Output = HttpResponse;
    fn to_response(&self) -> Self::Output {
        let reason = self.to_string();
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => {
                HttpResponse::BadRequest().json(ErrorResponse::new(reason))
            },
            ApiError::NotFound { .. } => {
                HttpResponse::NotFound().json(ErrorResponse::new(reason))
            },
            ApiError::Conflict { .. } => {
                HttpResponse::Conflict().json(ErrorResponse::new(reason))
            },
            ApiError::UpstreamUnavailable { source } => {
                warn!("Market data unavailable: {}", source);
                HttpResponse::InternalServerError().json(ErrorResponse::new(reason))
            },
            ApiError::Storage { source } => {
                error!("Database error: {}", source);
                HttpResponse::InternalServerError().json(ErrorResponse::new(reason))
            },
            ApiError::Export { source } => {
                error!("Export failed: {}", source);
                HttpResponse::InternalServerError().json(ErrorResponse::new(reason))
            },
        }
    }
}
