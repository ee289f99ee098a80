use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;

use crate::{errors::ServiceError, ApiResponse, ApiResult};

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Read whose store failure turns into an empty, unsuccessful payload.
/// Non-store errors propagate unchanged.
pub fn degrade_read<T: Serialize>(result: Result<T, ServiceError>, empty: T) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(success_response(data)),
        Err(err) if err.is_remote() => {
            warn!(error = %err, "read degraded to empty result");
            Ok(Json(ApiResponse::degraded(Some(empty), err.response_message())))
        }
        Err(err) => Err(err),
    }
}

/// Single-record read: `None` is a 404, a store failure degrades to no data
pub fn degrade_lookup<T: Serialize>(
    result: Result<Option<T>, ServiceError>,
    not_found: impl FnOnce() -> String,
) -> ApiResult<T> {
    match result {
        Ok(Some(data)) => Ok(success_response(data)),
        Ok(None) => Err(ServiceError::NotFound(not_found())),
        Err(err) if err.is_remote() => {
            warn!(error = %err, "lookup degraded to empty result");
            Ok(Json(ApiResponse::degraded(None, err.response_message())))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use assert_matches::assert_matches;

    fn offline() -> ServiceError {
        ServiceError::RemoteStoreError(StoreError::Backend("offline".into()))
    }

    #[test]
    fn store_failure_degrades_to_empty_list() {
        let Json(body) = degrade_read(Err(offline()), Vec::<String>::new()).unwrap();
        assert!(!body.success);
        assert_eq!(body.data, Some(vec![]));
        assert!(body.message.is_some());
    }

    #[test]
    fn validation_errors_are_not_degraded() {
        let result = degrade_read(
            Err(ServiceError::ValidationError("bad".into())),
            Vec::<String>::new(),
        );
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn absent_record_is_not_found() {
        let result = degrade_lookup(Ok(None::<String>), || "part X".into());
        assert_matches!(result, Err(ServiceError::NotFound(_)));

        let Json(body) = degrade_lookup(Err::<Option<String>, _>(offline()), || "x".into()).unwrap();
        assert!(!body.success);
        assert!(body.data.is_none());
    }
}
