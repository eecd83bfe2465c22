pub mod courses;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod parts;
pub mod remote;
pub mod stock;
pub mod users;
pub mod vehicles;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

/// JSON body extractor whose rejection keeps the error envelope.
///
/// Axum's stock `Json` rejects malformed or incomplete bodies with a
/// plain-text 422; every failure on this API is a
/// `{ "success": false, "message": ... }` 400 instead.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("request body rejected: {}", rejection.body_text());
                Err(ServiceError::InvalidInput("Invalid Input".into()))
            }
        }
    }
}

/// Wire form of a stock location: absent or empty string means the central
/// site, anything else must be a course UUID.
pub(crate) fn parse_location(value: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(|_| ServiceError::InvalidInput("Invalid Input".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_location_spellings() {
        assert_eq!(parse_location(None).unwrap(), None);
        assert_eq!(parse_location(Some("")).unwrap(), None);
        assert_eq!(parse_location(Some("  ")).unwrap(), None);

        let id = Uuid::new_v4();
        assert_eq!(parse_location(Some(&id.to_string())).unwrap(), Some(id));
        assert!(parse_location(Some("not-a-uuid")).is_err());
    }
}
