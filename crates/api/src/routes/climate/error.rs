use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::climate_data;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid date {0:?}, expected yyyy-mm-dd")]
    InvalidDate(String),
    #[error(transparent)]
    Data(#[from] climate_data::Error),
}

/// Body returned for every failed request
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Error::Data(climate_data::Error::DatasetUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
