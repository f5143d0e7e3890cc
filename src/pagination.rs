//! This modules defines the common functionality for paging data.

use std::str::FromStr;

use serde::Deserialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of items to return when a request does not give a limit.
    pub default_limit: u64,
    /// The largest limit a request may ask for. Larger limits are clamped to this value.
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// A window into an ordered list of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The maximum number of items to return.
    pub limit: u64,
    /// The number of items to skip.
    pub offset: u64,
}

impl Pagination {
    /// The limit as an SQLite integer.
    pub fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }

    /// The offset as an SQLite integer.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }
}

/// The raw `limit` and `offset` query parameters of a request.
///
/// The values are kept as strings so that empty parameters (`?limit=`) can be treated as absent
/// and bad values reported with the parameter's name.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    /// The requested page size.
    pub limit: Option<String>,
    /// The requested number of items to skip.
    pub offset: Option<String>,
}

impl PaginationConfig {
    /// Turn the raw query parameters into a [Pagination], filling in defaults and clamping the
    /// limit to [PaginationConfig::max_limit].
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidQuery] if `limit` or `offset` is not a non-negative integer.
    pub fn paginate(&self, query: &PaginationQuery) -> Result<Pagination, Error> {
        let limit = parse_query_param::<u64>("limit", query.limit.as_deref())?
            .unwrap_or(self.default_limit)
            .min(self.max_limit);
        let offset = parse_query_param::<u64>("offset", query.offset.as_deref())?.unwrap_or(0);

        Ok(Pagination { limit, offset })
    }
}

/// Parse an optional query parameter, treating an empty or blank value as absent.
///
/// # Errors
///
/// Returns an [Error::InvalidQuery] naming `name` if the value cannot be parsed.
pub(crate) fn parse_query_param<T: FromStr>(
    name: &str,
    value: Option<&str>,
) -> Result<Option<T>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidQuery(format!("{name}={raw}"))),
    }
}
