use {
    agenda_scheduling::{Error, ErrorKind},
    axum::{
        Json,
        extract::rejection::JsonRejection,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    tracing::error,
};

/// A service error on its way out as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::validation("body", rejection.body_text()))
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let message = if kind == ErrorKind::StoreFailure {
            error!(error = %self.0, "request failed");
            "internal storage error".to_string()
        } else {
            self.0.to_string()
        };

        let mut body = serde_json::json!({
            "success": false,
            "error": kind.as_str(),
            "message": message,
        });
        if let Error::Validation { field, .. } = &self.0 {
            body["field"] = serde_json::Value::String(field.clone());
        }
        (status_for(kind), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, agenda_common::Entity};

    #[test]
    fn statuses_follow_kinds() {
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError(Error::NotFound(Entity::Schedule))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(Error::Internal("disk on fire".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
