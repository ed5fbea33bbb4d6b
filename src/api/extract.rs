//! Request extractors that report rejections as [`ElectionError`], so a
//! malformed path, query string, or body gets the same JSON error body as
//! every other failure.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::ElectionId;
use crate::error::ElectionError;

/// The `{id}` segment of an election route.
#[derive(Debug, Clone, Copy)]
pub struct ElectionPath(pub ElectionId);

impl<S> FromRequestParts<S> for ElectionPath
where
    S: Send + Sync,
{
    type Rejection = ElectionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(path = %parts.uri.path(), %rejection, "bad election id");
                ElectionError::validation("id", "election id must be a UUID")
            })?;
        Ok(Self(ElectionId::from_uuid(id)))
    }
}

/// Query string parameters.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ElectionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ElectionError::validation("query", rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// A JSON request body.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ElectionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ElectionError::validation("body", rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Ballot {
        candidate_id: Uuid,
    }

    fn json_request(body: String) -> Request {
        let Ok(req) = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
        else {
            panic!("request should build");
        };
        req
    }

    #[tokio::test]
    async fn malformed_body_becomes_validation_error() {
        let truncated = json_request("{\"candidate_id\":".to_string());
        let result = ValidJson::<Ballot>::from_request(truncated, &()).await;
        let Err(ElectionError::Validation { field, .. }) = result else {
            panic!("expected validation error");
        };
        assert_eq!(field, "body");
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let id = Uuid::new_v4();
        let body = format!("{{\"candidate_id\":\"{id}\"}}");
        let Ok(ValidJson(ballot)) =
            ValidJson::<Ballot>::from_request(json_request(body), &()).await
        else {
            panic!("body should parse");
        };
        assert_eq!(ballot.candidate_id, id);
    }

    #[tokio::test]
    async fn bad_query_becomes_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[allow(dead_code)]
            page: Option<u32>,
        }

        let Ok(req) = axum::http::Request::builder()
            .uri("/?page=first")
            .body(())
        else {
            panic!("request should build");
        };
        let (mut parts, ()) = req.into_parts();
        let result = ValidQuery::<Params>::from_request_parts(&mut parts, &()).await;
        let Err(ElectionError::Validation { field, .. }) = result else {
            panic!("expected validation error");
        };
        assert_eq!(field, "query");
    }
}
