use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::{BookStore, Ranking, TopRatedQuery},
    error::AppResult,
    models::{BookId, BookSummary},
};

/// Non-personalized "popular and well reviewed" recommendations
///
/// The ranking itself runs in the database; this type only decides which
/// query shape each entry point uses.
#[derive(Clone)]
pub struct FallbackSupplier {
    store: Arc<dyn BookStore>,
}

impl FallbackSupplier {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Most reviewed qualifying books, never including `exclude`
    pub async fn for_user(
        &self,
        limit: i64,
        exclude: &HashSet<BookId>,
    ) -> AppResult<Vec<BookSummary>> {
        let mut exclude: Vec<BookId> = exclude.iter().copied().collect();
        exclude.sort_unstable();

        self.fetch(TopRatedQuery {
            limit,
            exclude,
            ranking: Ranking::Popularity,
        })
        .await
    }

    /// Best scored books with enough reviews, for callers without a user context
    pub async fn general(&self, limit: i64) -> AppResult<Vec<BookSummary>> {
        self.fetch(TopRatedQuery {
            limit,
            exclude: Vec::new(),
            ranking: Ranking::Acclaim,
        })
        .await
    }

    async fn fetch(&self, query: TopRatedQuery) -> AppResult<Vec<BookSummary>> {
        let books = self.store.top_rated(&query).await?;

        // The store is trusted for ordering, not for the list invariants
        let mut seen = HashSet::new();
        let books: Vec<BookSummary> = books
            .into_iter()
            .filter(|book| !query.exclude.contains(&book.id) && seen.insert(book.id))
            .take(query.limit.max(0) as usize)
            .map(|book| BookSummary {
                is_favorite: false,
                ..book
            })
            .collect();

        tracing::info!(
            ranking = ?query.ranking,
            limit = query.limit,
            returned = books.len(),
            "Fallback recommendations fetched"
        );

        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::MockBookStore;
    use crate::error::AppError;

    fn book(id: BookId) -> BookSummary {
        BookSummary {
            id,
            title: Some(format!("Book {}", id)),
            authors: None,
            categories: None,
            image: None,
            publisher: None,
            price: None,
            average_score: Some(4.5),
            reviews_count: Some(10),
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn test_for_user_passes_exclusions_and_popularity_ranking() {
        let mut store = MockBookStore::new();
        store
            .expect_top_rated()
            .withf(|q| q.limit == 3 && q.exclude == vec![4, 9] && q.ranking == Ranking::Popularity)
            .times(1)
            .returning(|_| Ok(vec![book(1), book(2)]));

        let supplier = FallbackSupplier::new(Arc::new(store));
        let books = supplier.for_user(3, &HashSet::from([9, 4])).await.unwrap();

        let ids: Vec<BookId> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_general_uses_acclaim_without_exclusions() {
        let mut store = MockBookStore::new();
        store
            .expect_top_rated()
            .withf(|q| q.limit == 5 && q.exclude.is_empty() && q.ranking == Ranking::Acclaim)
            .times(1)
            .returning(|_| Ok(vec![book(8)]));

        let supplier = FallbackSupplier::new(Arc::new(store));
        let books = supplier.general(5).await.unwrap();

        assert_eq!(books.len(), 1);
        assert!(!books[0].is_favorite);
    }

    #[tokio::test]
    async fn test_results_are_deduplicated_filtered_and_truncated() {
        let mut store = MockBookStore::new();
        store.expect_top_rated().returning(|_| {
            let mut flagged = book(3);
            flagged.is_favorite = true;
            Ok(vec![book(1), book(1), book(2), flagged, book(5), book(6)])
        });

        let supplier = FallbackSupplier::new(Arc::new(store));
        let books = supplier.for_user(3, &HashSet::from([2])).await.unwrap();

        let ids: Vec<BookId> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert!(books.iter().all(|b| !b.is_favorite));
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let mut store = MockBookStore::new();
        store
            .expect_top_rated()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));

        let supplier = FallbackSupplier::new(Arc::new(store));
        assert!(supplier.general(5).await.is_err());
    }
}
