use actix_web::{
    error::{JsonPayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpRequest,
    HttpResponse,
};
use group_buy_engine::SettlementError;
use log::{debug, error};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Settlement(#[from] SettlementError),
}

impl ServerError {
    /// The machine-readable tag returned in the `error` field of the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitializeError(_) => "InitializeError",
            Self::BackendError(_) => "BackendError",
            Self::InvalidRequestBody(_) => "InvalidRequestBody",
            Self::IOError(_) => "IOError",
            Self::NoRecordFound(_) => "NoRecordFound",
            Self::Settlement(e) => e.kind(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Settlement(e) => match e {
                SettlementError::GroupNotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::DividendNotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::LotteryNotFound(_) => StatusCode::NOT_FOUND,
                SettlementError::InvalidGroup(_) => StatusCode::BAD_REQUEST,
                SettlementError::GroupNotJoinable(_) => StatusCode::CONFLICT,
                SettlementError::GroupNotReady { .. } => StatusCode::CONFLICT,
                SettlementError::AlreadySettled(_) => StatusCode::CONFLICT,
                SettlementError::DividendAlreadyPaid(_) => StatusCode::CONFLICT,
                SettlementError::InvalidProductConfig { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SettlementError::NoParticipants(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SettlementError::InsufficientParticipants { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SettlementError::NoDividendRecipients { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SettlementError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ Request failed. {self}");
        }
        let mut body = json!({ "error": self.kind(), "message": self.to_string() });
        // A repeated draw is answered with the draw that already happened
        if let Self::Settlement(SettlementError::AlreadySettled(prior)) = self {
            body["result"] = json!(prior);
        }
        HttpResponse::build(status).insert_header(ContentType::json()).body(body.to_string())
    }
}

/// Bodies that cannot be parsed are answered in the same `{"error", "message"}` shape as every other failure.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejected the body of {} {}. {err}", req.method(), req.path());
    ServerError::InvalidRequestBody(err.to_string()).into()
}
