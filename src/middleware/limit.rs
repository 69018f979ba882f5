use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crate::{
    error::AppError, models::RecommendationQuery, services::recommendations::resolve_limit,
};

/// Validated `limit` query parameter of the recommendation endpoints
///
/// Malformed query strings are rejected as [`AppError::InvalidInput`] so the
/// caller gets the usual JSON error body instead of axum's plain-text one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Limit
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<RecommendationQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::InvalidInput(format!(
                    "limit must be a positive integer: {}",
                    rejection.body_text()
                ))
            })?;

        resolve_limit(query.limit).map(Limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> Result<Limit, AppError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Limit::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        assert_eq!(extract("/").await.unwrap(), Limit(10));
    }

    #[tokio::test]
    async fn test_accepts_positive_limit() {
        assert_eq!(extract("/?limit=3").await.unwrap(), Limit(3));
    }

    #[tokio::test]
    async fn test_rejects_malformed_or_non_positive_limit() {
        for uri in ["/?limit=abc", "/?limit=", "/?limit=2.5", "/?limit=0", "/?limit=-1"] {
            assert!(
                matches!(extract(uri).await, Err(AppError::InvalidInput(_))),
                "expected invalid input for {}",
                uri
            );
        }
    }
}
