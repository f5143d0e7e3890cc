//! The route handler for the combined transaction feed and its query parameters.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::{
    Date, Duration, OffsetDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryName,
    pagination::{PaginationConfig, PaginationQuery, parse_query_param},
    timestamp::Timestamp,
};

use super::{
    query::{TransactionFilter, query_transactions},
    view::TransactionKind,
};

/// The state needed for the transaction feed.
#[derive(Debug, Clone)]
pub struct TransactionEndpointState {
    /// The database connection for reading expenses and incomes.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Controls the default and maximum page size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The raw query parameters of a transaction feed request.
///
/// Empty parameters are treated as if they were not given.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    /// The page size.
    pub limit: Option<String>,
    /// How many transactions to skip.
    pub offset: Option<String>,
    /// An RFC 3339 date-time or a `YYYY-MM-DD` date, inclusive.
    pub from: Option<String>,
    /// An RFC 3339 date-time or a `YYYY-MM-DD` date, inclusive of the whole day.
    pub to: Option<String>,
    /// A month number from 1 to 12.
    pub month: Option<String>,
    /// A four digit year.
    pub year: Option<String>,
    /// Either "expense" or "income".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// A category name, matched without regard to case.
    pub category: Option<String>,
}

impl TransactionQuery {
    fn pagination_query(&self) -> PaginationQuery {
        PaginationQuery {
            limit: self.limit.clone(),
            offset: self.offset.clone(),
        }
    }

    /// Validate the filter parameters.
    ///
    /// # Errors
    /// Returns an [Error::InvalidQuery] for a malformed date, month or year, or an
    /// [Error::InvalidTransactionType] for a type other than "expense" or "income".
    pub fn to_filter(&self) -> Result<TransactionFilter, Error> {
        let month = parse_query_param::<u8>("month", self.month.as_deref())?;
        if let Some(month) = month.filter(|month| !(1..=12).contains(month)) {
            return Err(Error::InvalidQuery(format!("month={month}")));
        }

        let year = parse_query_param::<i32>("year", self.year.as_deref())?;
        if let Some(year) = year.filter(|year| !(1000..=9999).contains(year)) {
            return Err(Error::InvalidQuery(format!("year={year}")));
        }

        let kind = match non_blank(self.kind.as_deref()) {
            Some(raw) => Some(raw.parse::<TransactionKind>()?),
            None => None,
        };

        Ok(TransactionFilter {
            from: parse_bound("from", self.from.as_deref(), DayBound::Start)?,
            to: parse_bound("to", self.to.as_deref(), DayBound::End)?,
            month,
            year,
            kind,
            category: non_blank(self.category.as_deref()).map(CategoryName::new),
        })
    }
}

/// Which end of the day a plain date stands for.
#[derive(Debug, Clone, Copy)]
enum DayBound {
    Start,
    End,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_bound(name: &str, value: Option<&str>, bound: DayBound) -> Result<Option<Timestamp>, Error> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    if let Ok(date_time) = OffsetDateTime::parse(raw, &Rfc3339) {
        // Timestamps drop fractional seconds, so a fractional lower bound moves up to the next
        // whole second to stay inclusive.
        let date_time = match bound {
            DayBound::Start if date_time.nanosecond() > 0 => date_time + Duration::SECOND,
            _ => date_time,
        };

        return Ok(Some(Timestamp::from(date_time)));
    }

    let date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidQuery(format!("{name}={raw}")))?;

    let date_time = match bound {
        DayBound::Start => date.midnight(),
        DayBound::End => date
            .with_hms(23, 59, 59)
            .map_err(|_| Error::InvalidQuery(format!("{name}={raw}")))?,
    };

    Ok(Some(Timestamp::from(date_time.assume_utc())))
}

/// A route handler for the caller's expenses and incomes as one filtered, paged feed.
pub async fn query_transactions_endpoint(
    State(state): State<TransactionEndpointState>,
    Extension(user_id): Extension<UserID>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let Query(query) = query?;
    let pagination = state.pagination_config.paginate(&query.pagination_query())?;
    let filter = query.to_filter()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = query_transactions(user_id, pagination, &filter, &connection)?;

    Ok(Json(json!({ "transactions": transactions })))
}
