use actix_web::{http::StatusCode, HttpResponse};
use domain::DomainError;
use infra::StoreError;
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidPeriod { .. } | DomainError::InvalidId(_) => {
                ApiError::BadRequest(err.to_string())
            }
            DomainError::IdGeneration(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let status = self.status_code();
        // 内部错误只记录日志，不回传细节
        let message = match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Store(err) => {
                error!("store error: {} (root cause: {})", err, err.root_cause());
                "Internal Server Error".to_string()
            }
            Self::Internal(msg) => {
                error!("internal error: {}", msg);
                "Internal Server Error".to_string()
            }
        };
        HttpResponse::build(status).json(json!({
            "code": status.as_u16(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;
    use serde_json::Value;

    async fn body_of(err: ApiError) -> Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_validation_error_is_bad_request() {
        let err = ApiError::from(DomainError::InvalidPeriod { month: 13, year: 2024 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = body_of(err).await;
        assert_eq!(body["code"], 400);
        assert!(body["message"].as_str().unwrap().contains("13"));
    }

    #[actix_web::test]
    async fn test_store_error_hides_details() {
        let err = ApiError::from(StoreError::Aborted(Box::new(StoreError::DeadlineExceeded)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(err).await;
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[test]
    fn test_id_generation_failure_is_internal() {
        let err = ApiError::from(DomainError::IdGeneration("clock".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
