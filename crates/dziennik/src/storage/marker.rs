//! Last-posted marker.
//!
//! The marker file holds the citation line of the most recently published
//! act (`Dz.U. 2020 poz. 999`). Discovery resumes from the position after it.

use std::path::{Path, PathBuf};

use crate::act::Tables;
use crate::error::MarkerError;

/// Where discovery resumes: the last known position in a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Year being scanned.
    pub year: u32,
    /// Last position already handled; discovery starts at `position + 1`.
    pub position: u32,
}

/// Reads and writes the marker file.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    path: PathBuf,
    tables: Tables,
}

impl MarkerStore {
    /// Create a store for the marker at `path`.
    ///
    /// `tables` resolve milestone glyphs written in place of positions.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, tables: Tables) -> Self {
        Self {
            path: path.into(),
            tables,
        }
    }

    /// Path of the marker file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Year and position of the last posted act, `(0, 0)` when unavailable.
    #[must_use]
    pub fn last_posted(&self) -> (u32, u32) {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_marker(&content, &self.tables),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read marker");
                (0, 0)
            }
        }
    }

    /// Where discovery starts in `current_year`.
    ///
    /// An unreadable marker is fatal. A marker from another year restarts
    /// at position 0 of `current_year`.
    pub fn resume_point(&self, current_year: u32) -> Result<Cursor, MarkerError> {
        let (year, position) = self.last_posted();
        if year == 0 || position == 0 {
            let content = std::fs::read_to_string(&self.path).unwrap_or_default();
            tracing::error!(
                path = %self.path.display(),
                year,
                position,
                "There is a problem with obtaining last posted act"
            );
            return Err(MarkerError::Unavailable {
                path: self.path.clone(),
                content,
            });
        }

        let cursor = if year == current_year {
            Cursor { year, position }
        } else {
            tracing::info!(
                last_year = year,
                current_year,
                "New year, starting from the first position"
            );
            Cursor {
                year: current_year,
                position: 0,
            }
        };

        tracing::info!(
            current_year,
            "Last posted act Dz.U. {} poz. {}",
            year,
            position
        );
        Ok(cursor)
    }

    /// Persist `citation_line` as the last posted act.
    pub fn record(&self, citation_line: &str) -> Result<(), MarkerError> {
        let io_error = |source: std::io::Error| MarkerError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, format!("{citation_line}\n")).map_err(io_error)?;

        tracing::debug!(path = %self.path.display(), citation_line, "Saved marker");
        Ok(())
    }
}

/// Parse `(year, position)` out of the first line of a marker or post.
///
/// Expects at least four space-separated tokens with the year second and
/// the position fourth; anything else yields `(0, 0)`.
#[must_use]
pub fn parse_marker(content: &str, tables: &Tables) -> (u32, u32) {
    let first_line = content.lines().next().unwrap_or_default();
    let tokens: Vec<&str> = first_line.split(' ').collect();
    if tokens.len() < 4 {
        tracing::warn!(content, "Parsing marker: not enough tokens");
        return (0, 0);
    }

    let position_token = tokens[3].trim();
    let position = match position_token.parse::<u32>() {
        Ok(position) => position,
        Err(e) => match tables.milestone_position(position_token) {
            Some(position) => position,
            None => {
                tracing::warn!(content, error = %e, "Parsing marker position");
                return (0, 0);
            }
        },
    };

    match tokens[1].parse::<u32>() {
        Ok(year) => (year, position),
        Err(e) => {
            tracing::warn!(content, error = %e, "Parsing marker year");
            (0, 0)
        }
    }
}
