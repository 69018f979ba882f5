use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;

/// Primary key of the `books` table
pub type BookId = i32;

/// Identifier of a registered user
pub type UserId = i32;

/// The slice of a favorite book the recommender reads
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FavoriteBook {
    pub id: BookId,
    /// Decorated list text, e.g. `['Tolkien', 'Lewis']`
    pub authors: Option<String>,
    pub categories: Option<String>,
    pub average_score: Option<f64>,
}

/// Book row as stored, before conversion for the client
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookRow {
    pub id: BookId,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub categories: Option<String>,
    pub image: Option<String>,
    pub publisher: Option<String>,
    pub price: Option<BigDecimal>,
    pub average_score: Option<f64>,
    pub reviews_count: Option<i32>,
}

/// Book returned to the client in recommendation lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookSummary {
    pub id: BookId,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub categories: Option<String>,
    pub image: Option<String>,
    pub publisher: Option<String>,
    pub price: Option<f64>,
    pub average_score: Option<f64>,
    pub reviews_count: Option<i32>,
    pub is_favorite: bool,
}

impl From<BookRow> for BookSummary {
    fn from(row: BookRow) -> Self {
        // NUMERIC arrives as BigDecimal; clients expect a plain number
        let price = row
            .price
            .and_then(|price| price.to_string().parse::<f64>().ok());

        BookSummary {
            id: row.id,
            title: row.title,
            authors: row.authors,
            categories: row.categories,
            image: row.image,
            publisher: row.publisher,
            price,
            average_score: row.average_score,
            reviews_count: row.reviews_count,
            is_favorite: false,
        }
    }
}
