//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Optional `?category=` filter for catalog listings.
///
/// An empty value is the same as no filter.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryFilter {
    pub category: Option<String>,
}

impl CategoryFilter {
    pub fn as_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }
}
