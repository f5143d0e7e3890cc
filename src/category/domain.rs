//! Core category domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{auth::UserID, database_id::DatabaseId, timestamp::Timestamp};

/// A normalised category name: trimmed and lower-cased, never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// The name given to records created without a category.
    pub const UNCATEGORIZED: &str = "uncategorized";

    /// Normalise `name` into a category name.
    ///
    /// Surrounding whitespace is removed and the name is lower-cased, so "Groceries " and
    /// "groceries" name the same category. A blank name becomes
    /// [CategoryName::UNCATEGORIZED].
    pub fn new(name: &str) -> Self {
        let name = name.trim();

        if name.is_empty() {
            Self(Self::UNCATEGORIZED.to_owned())
        } else {
            Self(name.to_lowercase())
        }
    }

    /// Normalise an optional name, treating a missing name like a blank one.
    pub fn from_optional(name: Option<&str>) -> Self {
        Self::new(name.unwrap_or_default())
    }

    /// Create a category name without normalisation.
    ///
    /// The caller should ensure that the string is already trimmed, lower-case and not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// A per-user grouping of expenses and incomes, e.g. "rent" or "salary".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Hash)]
pub struct Category {
    /// The category's ID in the application database.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The normalised name, unique per user.
    pub name: CategoryName,
    /// When the category was first used.
    pub created_at: Timestamp,
}

#[cfg(test)]
mod category_name_tests {
    use super::CategoryName;

    #[test]
    fn lower_cases_and_trims() {
        assert_eq!(CategoryName::new("  Groceries\n").as_ref(), "groceries");
    }

    #[test]
    fn blank_name_is_uncategorized() {
        assert_eq!(CategoryName::new(" \t ").as_ref(), CategoryName::UNCATEGORIZED);
        assert_eq!(CategoryName::new("").as_ref(), CategoryName::UNCATEGORIZED);
    }

    #[test]
    fn missing_name_is_uncategorized() {
        assert_eq!(
            CategoryName::from_optional(None).as_ref(),
            CategoryName::UNCATEGORIZED
        );
    }

    #[test]
    fn different_cases_give_equal_names() {
        assert_eq!(CategoryName::new("FOOD"), CategoryName::new("food"));
    }
}
