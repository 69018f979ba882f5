use std::collections::BTreeSet;

use crate::models::{FavoriteBook, InterestProfile};

/// Rating assumed when no favorite carries a usable score
pub const DEFAULT_RATING: f64 = 3.5;

const UNKNOWN_AUTHOR: &str = "Unknown";
const GENERAL_CATEGORY: &str = "General";

// The model expects these features but favorites don't aggregate them
const PROFILE_PUBLISHER: &str = "Unknown";
const PROFILE_PUBLISHED_YEAR: &str = "2010";

/// Builds the synthetic "meta book" describing a user's taste
///
/// Returns `None` for an empty favorites list: there is nothing to
/// personalize on and the caller should go straight to the fallback.
pub fn build_profile(favorites: &[FavoriteBook]) -> Option<InterestProfile> {
    if favorites.is_empty() {
        return None;
    }

    let mut authors = BTreeSet::new();
    let mut categories = BTreeSet::new();
    let mut rating_sum = 0.0;
    let mut rating_count = 0usize;

    for book in favorites {
        if let Some(raw) = book.authors.as_deref() {
            authors.extend(parse_list_field(raw));
        }
        if let Some(raw) = book.categories.as_deref() {
            categories.extend(parse_list_field(raw));
        }
        if let Some(score) = book.average_score.filter(|s| s.is_finite()) {
            rating_sum += score;
            rating_count += 1;
        }
    }

    if authors.is_empty() {
        authors.insert(UNKNOWN_AUTHOR.to_string());
    }
    if categories.is_empty() {
        categories.insert(GENERAL_CATEGORY.to_string());
    }

    let average_rating = if rating_count > 0 {
        rating_sum / rating_count as f64
    } else {
        DEFAULT_RATING
    };

    Some(InterestProfile {
        authors,
        categories,
        average_rating,
        publisher: PROFILE_PUBLISHER.to_string(),
        published_year: PROFILE_PUBLISHED_YEAR.to_string(),
        average_review_rating: average_rating,
    })
}

/// Splits a stringified list such as `['A', 'B']` into trimmed tokens
pub fn parse_list_field(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|token| token.trim_matches(|c: char| is_list_decoration(c) || c.is_whitespace()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn is_list_decoration(c: char) -> bool {
    matches!(c, '[' | ']' | '\'' | '"')
}
