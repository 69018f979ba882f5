pub mod books;
pub mod postgres;

pub use books::{BookStore, PgBookStore, Ranking, TopRatedQuery};
pub use postgres::{create_pool, run_migrations};
