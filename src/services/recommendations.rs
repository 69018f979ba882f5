use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::BookStore,
    error::{AppError, AppResult},
    models::{BookId, BookSummary, FavoriteBook, ScoredCandidate, UserId},
    services::{
        fallback::FallbackSupplier, index_map::IndexMap, profile::build_profile,
        scorer::{Scorer, ScorerFailure},
    },
};

/// Page size used when the caller doesn't ask for one
pub const DEFAULT_LIMIT: i64 = 10;

/// Why a request was answered from the fallback list
#[derive(thiserror::Error, Debug)]
pub enum FallbackReason {
    #[error("user has no favorite books")]
    NoFavorites,

    #[error(transparent)]
    Scorer(#[from] ScorerFailure),

    #[error("no personalized candidates left after translation and filtering")]
    EmptyPersonalizedSet,

    #[error("storage failure: {0}")]
    Storage(#[source] AppError),
}

/// Resolves the `limit` query parameter, which must be a positive integer
pub fn resolve_limit(limit: Option<i64>) -> AppResult<i64> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(limit) if limit > 0 => Ok(limit),
        Some(limit) => Err(AppError::InvalidInput(format!(
            "limit must be a positive integer, got {}",
            limit
        ))),
    }
}

/// Generates favorite-based book recommendations
///
/// Personalization runs favorites → interest profile → scorer → index
/// translation → dedup → favorite filtering → truncation. Any failure or an
/// empty result along the way is answered with the fallback list instead;
/// only a failure of the fallback itself reaches the caller.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn BookStore>,
    scorer: Arc<dyn Scorer>,
    index_map: Arc<IndexMap>,
    fallback: FallbackSupplier,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn BookStore>,
        scorer: Arc<dyn Scorer>,
        index_map: Arc<IndexMap>,
    ) -> Self {
        let fallback = FallbackSupplier::new(store.clone());
        Self {
            store,
            scorer,
            index_map,
            fallback,
        }
    }

    pub fn index_map(&self) -> &IndexMap {
        &self.index_map
    }

    /// Personalized recommendations for a user, or the fallback list
    pub async fn recommend_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<BookSummary>> {
        let start = Instant::now();

        let (favorite_ids, reason) = match self.store.favorite_books(user_id).await {
            Ok(favorites) => {
                let favorite_ids: HashSet<BookId> = favorites.iter().map(|b| b.id).collect();
                match self.personalize(&favorites, &favorite_ids, limit).await {
                    Ok(books) => {
                        tracing::info!(
                            user_id,
                            favorites = favorites.len(),
                            returned = books.len(),
                            elapsed_ms = start.elapsed().as_millis(),
                            "Personalized recommendations served"
                        );
                        return Ok(books);
                    }
                    Err(reason) => (favorite_ids, reason),
                }
            }
            Err(e) => (HashSet::new(), FallbackReason::Storage(e)),
        };

        match &reason {
            FallbackReason::NoFavorites | FallbackReason::EmptyPersonalizedSet => {
                tracing::info!(user_id, reason = %reason, "Falling back to top rated books");
            }
            FallbackReason::Scorer(_) | FallbackReason::Storage(_) => {
                tracing::warn!(user_id, reason = %reason, "Personalization failed, falling back to top rated books");
            }
        }

        self.fallback
            .for_user(limit, &favorite_ids)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Fallback recommendations failed");
                AppError::Recommendation(e.to_string())
            })
    }

    /// Recommendations for callers without a user context
    pub async fn recommend_general(&self, limit: i64) -> AppResult<Vec<BookSummary>> {
        self.fallback.general(limit).await.map_err(|e| {
            tracing::error!(error = %e, "General recommendations failed");
            AppError::Recommendation(e.to_string())
        })
    }

    async fn personalize(
        &self,
        favorites: &[FavoriteBook],
        favorite_ids: &HashSet<BookId>,
        limit: i64,
    ) -> Result<Vec<BookSummary>, FallbackReason> {
        let profile = build_profile(favorites).ok_or(FallbackReason::NoFavorites)?;
        let candidates = self.scorer.score(&profile).await?;

        let translated = translate_candidates(&self.index_map, &candidates);
        tracing::debug!(
            candidates = candidates.len(),
            translated = translated.len(),
            "Scorer candidates translated"
        );

        let ids = select_ids(translated, favorite_ids, limit);
        if ids.is_empty() {
            return Err(FallbackReason::EmptyPersonalizedSet);
        }

        let books = self.hydrate(&ids).await.map_err(FallbackReason::Storage)?;
        if books.is_empty() {
            return Err(FallbackReason::EmptyPersonalizedSet);
        }

        Ok(books)
    }

    /// Loads book rows for `ids`, keeping the order of `ids`
    async fn hydrate(&self, ids: &[BookId]) -> AppResult<Vec<BookSummary>> {
        let mut by_id: HashMap<BookId, BookSummary> = self
            .store
            .books_by_ids(ids)
            .await?
            .into_iter()
            .map(|book| (book.id, book))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(|book| BookSummary {
                is_favorite: false,
                ..book
            })
            .collect())
    }
}

/// Maps candidates to book ids, dropping misses and repeats
///
/// The first occurrence of an id keeps its position.
pub fn translate_candidates(index_map: &IndexMap, candidates: &[ScoredCandidate]) -> Vec<BookId> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter_map(|candidate| index_map.translate(candidate.index))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Drops the user's favorites and truncates to `limit`
pub fn select_ids(translated: Vec<BookId>, favorite_ids: &HashSet<BookId>, limit: i64) -> Vec<BookId> {
    translated
        .into_iter()
        .filter(|id| !favorite_ids.contains(id))
        .take(limit.max(0) as usize)
        .collect()
}
