//! Translation table from inference-model row indices to book ids.
//!
//! The model was trained on a CSV export of the `books` table, and it answers
//! with row positions in that export. The map is built once at startup from the
//! same file and is read-only afterwards, so it can be shared across requests
//! behind an `Arc` without locking.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::models::BookId;

/// Column of the export holding the book's primary key
const ID_COLUMN: &str = "id";

#[derive(thiserror::Error, Debug)]
pub enum IndexMapError {
    #[error("failed to open index source {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("failed to read index source headers: {0}")]
    Headers(csv::Error),

    #[error("index source has no 'id' column")]
    MissingIdColumn,
}

/// Immutable row index → book id lookup
#[derive(Debug, Clone, Default)]
pub struct IndexMap {
    entries: HashMap<usize, BookId>,
}

impl IndexMap {
    /// Loads the map from a CSV export, degrading to an empty map on failure
    ///
    /// An unreadable source is logged and never aborts startup: every later
    /// translation simply misses and requests fall back to top-rated books.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        match Self::try_load(path) {
            Ok(map) => {
                tracing::info!(
                    path = %path.display(),
                    entries = map.len(),
                    "Book index map loaded"
                );
                map
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load book index map, personalized recommendations disabled"
                );
                Self::default()
            }
        }
    }

    /// Loads the map from a CSV file, surfacing failures to the caller
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, IndexMapError> {
        let path = path.as_ref();
        let reader = csv::Reader::from_path(path).map_err(|source| IndexMapError::Open {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_csv(reader)
    }

    /// Builds the map from any CSV byte stream with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, IndexMapError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, IndexMapError> {
        let id_position = reader
            .headers()
            .map_err(IndexMapError::Headers)?
            .iter()
            .position(|header| header.trim() == ID_COLUMN)
            .ok_or(IndexMapError::MissingIdColumn)?;

        let mut entries = HashMap::new();
        let mut skipped = 0usize;

        for (index, record) in reader.records().enumerate() {
            let book_id = match record {
                Ok(record) => record.get(id_position).and_then(parse_book_id),
                Err(e) => {
                    tracing::debug!(row = index, error = %e, "Unreadable index row");
                    None
                }
            };

            match book_id {
                Some(id) => {
                    entries.insert(index, id);
                }
                None => {
                    skipped += 1;
                    tracing::debug!(row = index, "Index row without a valid book id, skipping");
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Some index rows were dropped");
        }

        Ok(Self { entries })
    }

    /// Returns the book id at a model row index, if any
    pub fn translate(&self, index: i64) -> Option<BookId> {
        let index = usize::try_from(index).ok()?;
        self.entries.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(usize, BookId)> for IndexMap {
    fn from_iter<I: IntoIterator<Item = (usize, BookId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Accepts only positive integers; anything else is not a book id
fn parse_book_id(raw: &str) -> Option<BookId> {
    raw.trim().parse::<BookId>().ok().filter(|id| *id > 0)
}
