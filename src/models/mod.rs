use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod book;

pub use book::{BookId, BookRow, BookSummary, FavoriteBook, UserId};

/// Aggregated interest profile sent to the inference service
///
/// Built fresh for every request from the user's favorites and never stored.
/// Field names match the feature columns the model was trained on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterestProfile {
    pub authors: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub average_rating: f64,
    pub publisher: String,
    pub published_year: String,
    pub average_review_rating: f64,
}

/// One entry of the inference service's ranked answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    /// Row index into the model's book table
    pub index: i64,
    #[serde(default)]
    pub score: serde_json::Value,
}

/// Query string accepted by the recommendation endpoints
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<i64>,
}
