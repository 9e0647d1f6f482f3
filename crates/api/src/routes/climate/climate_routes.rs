use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    Json,
};
use log::debug;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::{Error, ErrorBody};
use crate::{parse_date, AppState, DateRange, Precipitation, TemperatureObservation};

/// Min/avg/max temperature over a date range; nulls when no measurement falls inside it
#[derive(Serialize, Deserialize, Debug, PartialEq, ToSchema)]
pub struct TemperatureSummary {
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "Precipitation per date over the trailing year", content_type = "application/json", body = BTreeMap<String, Option<f64>>),
        (status = SERVICE_UNAVAILABLE, description = "Dataset could not be opened", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query precipitation", body = ErrorBody)
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Option<f64>>>, Error> {
    let rows = state
        .climate_db
        .precipitation_since(state.window.cutoff())
        .await?;
    Ok(Json(precipitation_by_date(rows)))
}

/// Folds rows into a date-keyed map. Rows arrive oldest first; when several
/// stations report the same date the last row read wins.
pub fn precipitation_by_date(rows: Vec<Precipitation>) -> BTreeMap<String, Option<f64>> {
    rows.into_iter()
        .map(|row| (row.date, row.precipitation))
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Every station id in the dataset", content_type = "application/json", body = Vec<String>),
        (status = SERVICE_UNAVAILABLE, description = "Dataset could not be opened", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query stations", body = ErrorBody)
    ))]
pub async fn stations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, Error> {
    let ids = state.climate_db.all_station_ids().await?;
    Ok(Json(ids))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "Temperature observations for the most active station over the trailing year", content_type = "application/json", body = Vec<TemperatureObservation>),
        (status = SERVICE_UNAVAILABLE, description = "Dataset could not be opened", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query observations", body = ErrorBody)
    ))]
pub async fn tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TemperatureObservation>>, Error> {
    let observations = state
        .climate_db
        .observations_for_station_since(&state.most_active_station, state.window.cutoff())
        .await?;
    Ok(Json(observations))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}",
    params(
        ("start" = String, Path, description = "First date included, yyyy-mm-dd"),
    ),
    responses(
        (status = OK, description = "Temperature summary from the start date to the end of the dataset", content_type = "application/json", body = TemperatureSummary),
        (status = BAD_REQUEST, description = "Malformed date (only when strict date checking is enabled)", body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Dataset could not be opened", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query temperatures", body = ErrorBody)
    ))]
pub async fn temperature_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<TemperatureSummary>, Error> {
    summarize(&state, DateRange { start, end: None }).await
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}/{end}",
    params(
        ("start" = String, Path, description = "First date included, yyyy-mm-dd"),
        ("end" = String, Path, description = "Last date included, yyyy-mm-dd"),
    ),
    responses(
        (status = OK, description = "Temperature summary between the two dates inclusive", content_type = "application/json", body = TemperatureSummary),
        (status = BAD_REQUEST, description = "Malformed date (only when strict date checking is enabled)", body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Dataset could not be opened", body = ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query temperatures", body = ErrorBody)
    ))]
pub async fn temperature_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<TemperatureSummary>, Error> {
    summarize(
        &state,
        DateRange {
            start,
            end: Some(end),
        },
    )
    .await
}

async fn summarize(state: &AppState, range: DateRange) -> Result<Json<TemperatureSummary>, Error> {
    if state.strict_dates {
        validate_date(&range.start)?;
        if let Some(end) = &range.end {
            validate_date(end)?;
        }
    }

    let stats = state.climate_db.temperature_stats(&range).await?;
    if stats.tavg.is_none() {
        debug!("no temperature observations in {:?}", range);
    }

    Ok(Json(TemperatureSummary {
        start_date: range.start,
        end_date: range.end,
        tmin: stats.tmin,
        tavg: stats.tavg.map(round_tenths),
        tmax: stats.tmax,
    }))
}

fn validate_date(value: &str) -> Result<(), Error> {
    parse_date(value)
        .map(|_| ())
        .map_err(|_| Error::InvalidDate(value.to_owned()))
}

/// Round to one decimal place, ties to even on the exact binary value
pub fn round_tenths(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}
