pub mod advice;
pub mod aggregation;
pub mod clients;
pub mod climate;
mod config;
mod error;
pub mod fallback;
mod monitor;
pub mod satellite;
mod storage;
pub mod types;
mod utils;

pub use config::*;
pub use error::{ErrorKind, MonitorError};
pub use monitor::AirQualityMonitor;
pub use storage::{InMemoryRecordStore, RecordStore, StoreError, StoredRecord};

pub use aggregation::aggregator::{aggregate, round_half_even};
pub use fallback::credential_list::CredentialList;
pub use fallback::error::{FailureKind, FetchError};
pub use fallback::fetcher::{FallbackFetcher, FetchResult, Fetched};

pub use advice::generator::{AdviceGenerator, AdviceService, AdviceSource};
pub use advice::subject::SubjectCategory;
pub use clients::daymet::ClimatePeriod;
pub use clients::openweather::PollutionMode;
pub use climate::error::ClimateError;
pub use satellite::error::SatelliteError;
pub use satellite::granule::GranuleDecoder;
pub use satellite::grid::{GridArray, GridAxes, GridPoint, SatelliteGrid};

pub use types::envelope::{Envelope, ErrorBody};
pub use types::gas::GasType;
pub use types::location::{Coordinates, LatLon, LocationMatch};
pub use types::pollution::{AqiCategory, DailyAggregate, HourlySample, Pollutant};
pub use types::reports::*;
