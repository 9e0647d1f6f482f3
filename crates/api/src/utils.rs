use anyhow::anyhow;
use clap::Parser;
use climate_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_ANCHOR_DATE, DEFAULT_API_PORT,
    DEFAULT_DATABASE, DEFAULT_MOST_ACTIVE_STATION, DEFAULT_TRAILING_DAYS,
};
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::{parse_date, TrailingWindow};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default, PartialEq)]
#[command(
    author,
    version,
    about = "Climate API - read-only precipitation and temperature queries over a weather dataset"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $CLIMATE_API_CONFIG, ./climate-api.toml,
    /// $XDG_CONFIG_HOME/climate-api/climate-api.toml, /etc/climate-api/climate-api.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "CLIMATE_API_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(long, env = "CLIMATE_API_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CLIMATE_API_PORT")]
    pub port: Option<String>,

    /// Path to the SQLite dataset with `measurement` and `station` tables
    #[arg(short, long, env = "CLIMATE_API_DATABASE")]
    pub database: Option<String>,

    /// Last date of the dataset snapshot (yyyy-mm-dd); trailing windows end here
    #[arg(long, env = "CLIMATE_API_ANCHOR_DATE")]
    pub anchor_date: Option<String>,

    /// Length of the trailing window in days
    #[arg(long, env = "CLIMATE_API_TRAILING_DAYS")]
    pub trailing_days: Option<u16>,

    /// Station served by /api/v1.0/tobs
    #[arg(long, env = "CLIMATE_API_MOST_ACTIVE_STATION")]
    pub most_active_station: Option<String>,

    /// Reject malformed start/end dates with 400 instead of querying with them
    #[arg(long, env = "CLIMATE_API_STRICT_DATES")]
    pub strict_dates: Option<bool>,
}

impl Cli {
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port
            .clone()
            .unwrap_or_else(|| DEFAULT_API_PORT.to_string())
    }

    pub fn database(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
    }

    pub fn most_active_station(&self) -> String {
        self.most_active_station
            .clone()
            .unwrap_or_else(|| DEFAULT_MOST_ACTIVE_STATION.to_string())
    }

    pub fn strict_dates(&self) -> bool {
        self.strict_dates.unwrap_or(false)
    }

    /// Trailing window built from `anchor_date` and `trailing_days`
    pub fn window(&self) -> anyhow::Result<TrailingWindow> {
        let anchor = self.anchor_date.as_deref().unwrap_or(DEFAULT_ANCHOR_DATE);
        let anchor = parse_date(anchor)
            .map_err(|e| anyhow!("invalid anchor date {:?}: {}", anchor, e))?;
        Ok(TrailingWindow::new(
            anchor,
            self.trailing_days.unwrap_or(DEFAULT_TRAILING_DAYS),
        ))
    }

    /// Fill unset values from `file`; values already set here win
    pub fn merge(self, file: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(file.level),
            host: self.host.or(file.host),
            port: self.port.or(file.port),
            database: self.database.or(file.database),
            anchor_date: self.anchor_date.or(file.anchor_date),
            trailing_days: self.trailing_days.or(file.trailing_days),
            most_active_station: self.most_active_station.or(file.most_active_station),
            strict_dates: self.strict_dates.or(file.strict_dates),
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> anyhow::Result<(Cli, ConfigSource)> {
    let cli_args = Cli::parse();

    let source = match &cli_args.config {
        Some(path) => ConfigSource::Explicit(path.into()),
        None => find_config_file("CLIMATE_API_CONFIG", "climate-api.toml"),
    };
    let file_config: Cli = load_config(&source)?;

    // env vars are already folded into cli_args by clap
    Ok((cli_args.merge(file_config), source))
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    cli.level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}: {}",
                OffsetDateTime::now_utc()
                    .format(&Iso8601::DEFAULT)
                    .unwrap_or_default(),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
