pub mod fallback;
pub mod index_map;
pub mod profile;
pub mod recommendations;
pub mod scorer;

pub use fallback::FallbackSupplier;
pub use index_map::IndexMap;
pub use recommendations::RecommendationService;
pub use scorer::{HttpScorer, Scorer, ScorerFailure};
