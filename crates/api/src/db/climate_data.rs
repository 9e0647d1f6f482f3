use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    ConnectOptions, Connection, FromRow,
};
use time::Date;
use utoipa::ToSchema;

use crate::format_date;

const PRECIPITATION_SINCE: &str = "SELECT date, prcp AS precipitation \
     FROM measurement \
     WHERE date >= ? \
     ORDER BY date";

const STATION_IDS: &str = "SELECT station FROM station";

const OBSERVATIONS_FOR_STATION_SINCE: &str = "SELECT date, tobs \
     FROM measurement \
     WHERE station = ? AND date >= ? \
     ORDER BY date";

const TEMPERATURE_STATS_SINCE: &str = "SELECT MIN(tobs) AS tmin, AVG(tobs) AS tavg, MAX(tobs) AS tmax \
     FROM measurement \
     WHERE date >= ?";

const TEMPERATURE_STATS_BETWEEN: &str = "SELECT MIN(tobs) AS tmin, AVG(tobs) AS tavg, MAX(tobs) AS tmax \
     FROM measurement \
     WHERE date >= ? AND date <= ?";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(#[source] sqlx::Error),
    #[error("Failed to query dataset: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to format date: {0}")]
    DateFormat(#[from] time::error::Format),
}

/// Read-only queries over the measurement and station tables.
#[async_trait]
pub trait ClimateData: Sync + Send {
    /// Date and precipitation for every measurement on or after `cutoff`, oldest first.
    /// Dates reported by several stations appear once per station.
    async fn precipitation_since(&self, cutoff: Date) -> Result<Vec<Precipitation>, Error>;
    /// Every station id, in the order the dataset yields them
    async fn all_station_ids(&self) -> Result<Vec<String>, Error>;
    async fn observations_for_station_since(
        &self,
        station_id: &str,
        cutoff: Date,
    ) -> Result<Vec<TemperatureObservation>, Error>;
    /// MIN/AVG/MAX of the temperature observations inside `range`, nulls ignored.
    /// All three are `None` when nothing matches.
    async fn temperature_stats(&self, range: &DateRange) -> Result<TemperatureStats, Error>;
}

pub struct ClimateAccess {
    options: SqliteConnectOptions,
}

impl ClimateAccess {
    pub fn new(database: &str) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(database)
            .read_only(true)
            .create_if_missing(false)
            .log_statements(log::LevelFilter::Debug);
        Self { options }
    }

    /// Opens a fresh connection for a single call; connections are never shared between requests
    pub async fn open_connection(&self) -> Result<SqliteConnection, Error> {
        self.options
            .connect()
            .await
            .map_err(Error::DatasetUnavailable)
    }

    async fn release(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!("error closing dataset connection: {}", e);
        }
    }
}

#[async_trait]
impl ClimateData for ClimateAccess {
    async fn precipitation_since(&self, cutoff: Date) -> Result<Vec<Precipitation>, Error> {
        let cutoff = format_date(cutoff)?;
        let mut conn = self.open_connection().await?;
        let rows = sqlx::query_as::<_, Precipitation>(PRECIPITATION_SINCE)
            .bind(cutoff.as_str())
            .fetch_all(&mut conn)
            .await;
        Self::release(conn).await;

        let rows = rows?;
        debug!("precipitation since {}: {} rows", cutoff, rows.len());
        Ok(rows)
    }

    async fn all_station_ids(&self) -> Result<Vec<String>, Error> {
        let mut conn = self.open_connection().await?;
        let ids = sqlx::query_scalar::<_, String>(STATION_IDS)
            .fetch_all(&mut conn)
            .await;
        Self::release(conn).await;

        Ok(ids?)
    }

    async fn observations_for_station_since(
        &self,
        station_id: &str,
        cutoff: Date,
    ) -> Result<Vec<TemperatureObservation>, Error> {
        let cutoff = format_date(cutoff)?;
        let mut conn = self.open_connection().await?;
        let rows = sqlx::query_as::<_, TemperatureObservation>(OBSERVATIONS_FOR_STATION_SINCE)
            .bind(station_id)
            .bind(cutoff.as_str())
            .fetch_all(&mut conn)
            .await;
        Self::release(conn).await;

        let rows = rows?;
        debug!(
            "observations for {} since {}: {} rows",
            station_id,
            cutoff,
            rows.len()
        );
        Ok(rows)
    }

    async fn temperature_stats(&self, range: &DateRange) -> Result<TemperatureStats, Error> {
        let query = match &range.end {
            Some(end) => sqlx::query_as::<_, TemperatureStats>(TEMPERATURE_STATS_BETWEEN)
                .bind(range.start.as_str())
                .bind(end.as_str()),
            None => sqlx::query_as::<_, TemperatureStats>(TEMPERATURE_STATS_SINCE)
                .bind(range.start.as_str()),
        };

        let mut conn = self.open_connection().await?;
        let stats = query.fetch_one(&mut conn).await;
        Self::release(conn).await;

        Ok(stats?)
    }
}

/// Inclusive date bounds as supplied by the caller, compared as `yyyy-mm-dd` strings
#[derive(Clone, Debug, PartialEq)]
pub struct DateRange {
    pub start: String,
    pub end: Option<String>,
}

#[derive(Clone, Debug, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Precipitation {
    pub date: String,
    pub precipitation: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct TemperatureObservation {
    pub date: String,
    pub tobs: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub tmin: Option<f64>,
    pub tavg: Option<f64>,
    pub tmax: Option<f64>,
}
