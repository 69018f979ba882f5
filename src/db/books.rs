use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{BookId, BookRow, BookSummary, FavoriteBook, UserId},
};

/// Books below this average score never appear in fallback lists
pub const MIN_AVERAGE_SCORE: f64 = 4.0;

/// Review count required by the acclaim ranking
pub const MIN_REVIEWS_COUNT: i32 = 5;

/// How qualifying books are ordered in a top-rated query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    /// Most reviewed first
    Popularity,
    /// Best scored first, restricted to books with enough reviews
    Acclaim,
}

/// Parameters of a top-rated books query
#[derive(Debug, Clone, PartialEq)]
pub struct TopRatedQuery {
    pub limit: i64,
    pub exclude: Vec<BookId>,
    pub ranking: Ranking,
}

/// Read access to the book catalog and users' favorites
///
/// Everything the recommender needs from the relational store goes through
/// this trait so the pipeline can run against fixtures.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BookStore: Send + Sync {
    /// Favorite books of a user, in no particular order
    async fn favorite_books(&self, user_id: UserId) -> AppResult<Vec<FavoriteBook>>;

    /// Books with the given ids, in no particular order; unknown ids are skipped
    async fn books_by_ids(&self, ids: &[BookId]) -> AppResult<Vec<BookSummary>>;

    /// Highest ranked books above the quality threshold, ties broken randomly
    async fn top_rated(&self, query: &TopRatedQuery) -> AppResult<Vec<BookSummary>>;
}

const TOP_BY_POPULARITY: &str = r#"
    SELECT id, title, authors, categories, image, publisher, price, average_score, reviews_count
    FROM books
    WHERE average_score >= $1
      AND NOT (id = ANY($2))
    ORDER BY reviews_count DESC NULLS LAST, RANDOM()
    LIMIT $3
"#;

const TOP_BY_ACCLAIM: &str = r#"
    SELECT id, title, authors, categories, image, publisher, price, average_score, reviews_count
    FROM books
    WHERE average_score >= $1
      AND reviews_count >= $4
      AND NOT (id = ANY($2))
    ORDER BY average_score DESC, reviews_count DESC, RANDOM()
    LIMIT $3
"#;

/// PostgreSQL-backed [`BookStore`]
#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookStore for PgBookStore {
    async fn favorite_books(&self, user_id: UserId) -> AppResult<Vec<FavoriteBook>> {
        let favorites = sqlx::query_as::<_, FavoriteBook>(
            r#"
            SELECT b.id, b.authors, b.categories, b.average_score
            FROM books b
            JOIN user_favorite_books ufb ON b.id = ufb.book_id
            WHERE ufb.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }

    async fn books_by_ids(&self, ids: &[BookId]) -> AppResult<Vec<BookSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, authors, categories, image, publisher, price, average_score, reviews_count
            FROM books
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookSummary::from).collect())
    }

    async fn top_rated(&self, query: &TopRatedQuery) -> AppResult<Vec<BookSummary>> {
        let sql = match query.ranking {
            Ranking::Popularity => TOP_BY_POPULARITY,
            Ranking::Acclaim => TOP_BY_ACCLAIM,
        };

        let mut statement = sqlx::query_as::<_, BookRow>(sql)
            .bind(MIN_AVERAGE_SCORE)
            .bind(&query.exclude[..])
            .bind(query.limit);
        if query.ranking == Ranking::Acclaim {
            statement = statement.bind(MIN_REVIEWS_COUNT);
        }

        let rows = statement.fetch_all(&self.pool).await?;

        tracing::debug!(
            ranking = ?query.ranking,
            excluded = query.exclude.len(),
            returned = rows.len(),
            "Top rated books fetched"
        );

        Ok(rows.into_iter().map(BookSummary::from).collect())
    }
}
