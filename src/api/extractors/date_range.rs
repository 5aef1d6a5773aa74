use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use crate::api::dtos::requests::{parse_date, DateRangeQuery};
use crate::domain::models::occurrence::DateRange;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// Optional `?start=YYYY-MM-DD&end=YYYY-MM-DD` query, half-open.
pub struct OptionalDateRange(pub Option<DateRange>);

impl FromRequestParts<Arc<AppState>> for OptionalDateRange {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<DateRangeQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(format!("Invalid query string: {}", e.body_text())))?;

        match (query.start.as_deref(), query.end.as_deref()) {
            (None, None) => Ok(OptionalDateRange(None)),
            (Some(start), Some(end)) => {
                let start = parse_date(start, "start")?;
                let end = parse_date(end, "end")?;
                Ok(OptionalDateRange(Some(DateRange::new(start, end)?)))
            }
            _ => Err(AppError::Validation("Both start and end are required for a date range.".into())),
        }
    }
}
