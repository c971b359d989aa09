//! Page window for table reads.

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// A 1-based page request, filled in with the table's totals after the read.
///
/// Meant for browsing small tables: every read also counts the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    /// Number of pages at `page_size`, set by the read.
    #[serde(default)]
    pub page_count: i64,
    /// Rows in the table, set by the read.
    #[serde(default)]
    pub total: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page,
            page_size,
            page_count: 0,
            total: 0,
        }
    }

    /// Reject windows that address no rows.
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(MigrateError::Config(format!(
                "page must be 1 or greater, got {}",
                self.page
            )));
        }
        if self.page_size < 1 {
            return Err(MigrateError::Config(format!(
                "page_size must be 1 or greater, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Record the table total and derive the page count from it.
    pub fn set_total(&mut self, total: i64) {
        self.total = total;
        self.page_count = if self.page_size > 0 {
            (total + self.page_size - 1) / self.page_size
        } else {
            0
        };
    }
}
