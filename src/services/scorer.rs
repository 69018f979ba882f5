//! Client for the external inference service
//!
//! The service receives an interest profile and answers with model row
//! indices ranked by relevance. Translating those indices into book ids is
//! the orchestrator's job; this module only moves bytes and validates shape.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

use crate::models::{InterestProfile, ScoredCandidate};

/// Why a scoring round trip produced no usable answer
#[derive(thiserror::Error, Debug)]
pub enum ScorerFailure {
    #[error("scorer request timed out after {0:?}")]
    Timeout(Duration),

    #[error("scorer transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("scorer returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("scorer response has no 'recommendations' key")]
    MissingRecommendations,

    #[error("malformed scorer response: {0}")]
    Malformed(String),
}

/// Scores an interest profile against the model's book catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Scorer: Send + Sync {
    /// Ranked candidates, best first, exactly as the service returned them
    async fn score(&self, profile: &InterestProfile) -> Result<Vec<ScoredCandidate>, ScorerFailure>;
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    recommendations: Option<Vec<ScoredCandidate>>,
}

/// [`Scorer`] backed by the inference service's HTTP prediction endpoint
#[derive(Clone)]
pub struct HttpScorer {
    http_client: HttpClient,
    url: String,
    timeout: Duration,
}

impl HttpScorer {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ScorerFailure> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(ScorerFailure::Transport)?;

        Ok(Self {
            http_client,
            url,
            timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ScorerFailure {
        if error.is_timeout() {
            ScorerFailure::Timeout(self.timeout)
        } else {
            ScorerFailure::Transport(error)
        }
    }
}

#[async_trait::async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, profile: &InterestProfile) -> Result<Vec<ScoredCandidate>, ScorerFailure> {
        tracing::debug!(
            authors = profile.authors.len(),
            categories = profile.categories.len(),
            average_rating = profile.average_rating,
            "Sending profile to scorer"
        );

        let response = self
            .http_client
            .post(&self.url)
            .json(profile)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScorerFailure::Status { status, body });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let candidates = parse_predict_response(&body)?;

        tracing::debug!(candidates = candidates.len(), "Scorer responded");

        Ok(candidates)
    }
}

fn parse_predict_response(body: &str) -> Result<Vec<ScoredCandidate>, ScorerFailure> {
    let parsed: PredictResponse =
        serde_json::from_str(body).map_err(|e| ScorerFailure::Malformed(e.to_string()))?;

    parsed
        .recommendations
        .ok_or(ScorerFailure::MissingRecommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::BTreeSet;

    fn profile() -> InterestProfile {
        InterestProfile {
            authors: BTreeSet::from(["Tolkien".to_string()]),
            categories: BTreeSet::from(["Fantasy".to_string()]),
            average_rating: 4.5,
            publisher: "Unknown".to_string(),
            published_year: "2010".to_string(),
            average_review_rating: 4.5,
        }
    }

    /// Serves `router` on an ephemeral port and returns its /predict URL
    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/predict", addr)
    }

    fn scorer(url: String) -> HttpScorer {
        HttpScorer::new(url, Duration::from_millis(300)).unwrap()
    }

    #[test]
    fn test_parse_preserves_order() {
        let body = r#"{"recommendations": [{"index": 2, "score": 0.9}, {"index": 0, "score": 0.8}, {"index": 1}]}"#;
        let indices: Vec<i64> = parse_predict_response(body)
            .unwrap()
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(indices, vec![2, 0, 1]);
    }

    #[test]
    fn test_parse_missing_key() {
        assert!(matches!(
            parse_predict_response(r#"{"prediction": [1, 2]}"#),
            Err(ScorerFailure::MissingRecommendations)
        ));
        assert!(matches!(
            parse_predict_response(r#"{"recommendations": null}"#),
            Err(ScorerFailure::MissingRecommendations)
        ));
    }

    #[test]
    fn test_parse_wrong_shape() {
        for body in [
            "not json",
            r#"{"recommendations": "nope"}"#,
            r#"{"recommendations": [3, 4]}"#,
            r#"{"recommendations": [{"score": 1.0}]}"#,
            r#"{"recommendations": [{"index": "7"}]}"#,
        ] {
            assert!(
                matches!(parse_predict_response(body), Err(ScorerFailure::Malformed(_))),
                "expected malformed for {}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_score_posts_profile_and_returns_candidates() {
        let router = Router::new().route(
            "/predict",
            post(|Json(payload): Json<Value>| async move {
                assert_eq!(payload["authors"], json!(["Tolkien"]));
                assert_eq!(payload["published_year"], "2010");
                Json(json!({ "recommendations": [{"index": 5, "score": 0.7}, {"index": 1, "score": 0.2}] }))
            }),
        );
        let url = spawn_stub(router).await;

        let candidates = scorer(url).score(&profile()).await.unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].index, 5);
        assert_eq!(candidates[1].index, 1);
    }

    #[tokio::test]
    async fn test_score_non_success_status() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "model exploded") }),
        );
        let url = spawn_stub(router).await;

        match scorer(url).score(&profile()).await {
            Err(ScorerFailure::Status { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "model exploded");
            }
            other => panic!("expected status failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_score_missing_recommendations_key() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json(json!({ "prediction": [] })) }),
        );
        let url = spawn_stub(router).await;

        let result = scorer(url).score(&profile()).await;
        assert!(matches!(result, Err(ScorerFailure::MissingRecommendations)));
    }

    #[tokio::test]
    async fn test_score_times_out() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "recommendations": [] }))
            }),
        );
        let url = spawn_stub(router).await;

        let result = scorer(url).score(&profile()).await;
        assert!(matches!(result, Err(ScorerFailure::Timeout(_))));
    }

    #[tokio::test]
    async fn test_score_unreachable_service() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = scorer(format!("http://{}/predict", addr))
            .score(&profile())
            .await;
        assert!(matches!(result, Err(ScorerFailure::Transport(_))));
    }
}
