pub mod climate_data;

pub use climate_data::{
    ClimateAccess, ClimateData, DateRange, Precipitation, TemperatureObservation,
    TemperatureStats,
};
