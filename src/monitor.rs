//! The main entry point: one [`AirQualityMonitor`] owns the shared HTTP client
//! and every provider adapter, and exposes one builder method per operation.

use crate::advice::generator::{AdviceGenerator, AdviceRequest, AdviceService};
use crate::aggregation::aggregator::aggregate;
use crate::clients::daymet::{ClimatePeriod, ClimateQuery, DaymetClient};
use crate::clients::earthdata::EarthdataClient;
use crate::clients::elevation::ElevationClient;
use crate::clients::open_meteo::{self, OpenMeteoClient};
use crate::clients::openai::OpenAiAdviceGenerator;
use crate::clients::openweather::{self, OpenWeatherClient, PollutionMode};
use crate::climate::parser;
use crate::config::{ConfigError, MonitorConfig};
use crate::error::MonitorError;
use crate::satellite::granule::{granule_path, GranuleDecoder};
use crate::satellite::locator::SatelliteLocator;
use crate::storage::{InMemoryRecordStore, RecordStore, StoredRecord};
use crate::types::gas::GasType;
use crate::types::location::LatLon;
use crate::types::pollution::AqiCategory;
use crate::types::reports::{
    AdviceReport, ClimateParameters, ClimateReport, DailyForecastReport, LocationSearchReport,
    OperationInfo, PollutionReport, SatelliteGasReport, ServiceInfo, WeatherForecastReport,
};
use crate::utils::{default_data_dir, ensure_data_dir_exists};
use bon::bon;
use chrono::NaiveDate;
use log::info;
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Column values in level-3 granules are per cm², reports are per m².
const CM2_PER_M2: f64 = 10_000.0;

const DEFAULT_SEARCH_LIMIT: u8 = 5;
const MAX_SEARCH_LIMIT: u8 = 10;

const OPERATIONS: [OperationInfo; 9] = [
    OperationInfo {
        name: "current_pollution",
        route: "/air-pollution/current?lat={lat}&lon={lon}",
    },
    OperationInfo {
        name: "forecast_pollution",
        route: "/air-pollution/forecast?lat={lat}&lon={lon}",
    },
    OperationInfo {
        name: "daily_forecast",
        route: "/air-pollution/forecast-daily?lat={lat}&lon={lon}",
    },
    OperationInfo {
        name: "geocoding_search",
        route: "/geocoding/search?q={query}&limit={limit}",
    },
    OperationInfo {
        name: "weather_forecast",
        route: "/weather/forecast?lat={lat}&lon={lon}",
    },
    OperationInfo {
        name: "tempo_gas_data",
        route: "/air-pollution/tempo?gas={gas}&lat={lat}&lon={lon}&start_date={YYYY-MM-DD}&end_date={YYYY-MM-DD}",
    },
    OperationInfo {
        name: "climate_data",
        route: "/climate/daymet?lat={lat}&lon={lon}&vars={vars}&years={years}",
    },
    OperationInfo {
        name: "health_advice",
        route: "/health/advice",
    },
    OperationInfo {
        name: "store_record",
        route: "/records/{collection}",
    },
];

/// Aggregates the air-quality, weather, satellite and climate providers.
///
/// Build one per process with [`AirQualityMonitor::new()`] (configuration from
/// the environment) or [`AirQualityMonitor::from_config()`], then share it.
/// The underlying [`Client`] is created once and reused by every provider.
///
/// # Examples
///
/// ```no_run
/// # use air_quality_monitor::{AirQualityMonitor, LatLon, MonitorError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), MonitorError> {
/// let monitor = AirQualityMonitor::new()?;
/// let report = monitor
///     .fetch_pollution()
///     .location(LatLon(-23.55, -46.63))
///     .call()
///     .await?;
/// println!("{} samples", report.data.list.len());
/// # Ok(())
/// # }
/// ```
pub struct AirQualityMonitor {
    data_dir: PathBuf,
    satellite_search_days: u32,
    climate_row_cap: usize,
    openweather: OpenWeatherClient,
    open_meteo: OpenMeteoClient,
    elevation: ElevationClient,
    earthdata: EarthdataClient,
    daymet: DaymetClient,
    advice: AdviceService,
    granule_decoder: Option<Arc<dyn GranuleDecoder>>,
    record_store: Arc<dyn RecordStore>,
}

#[bon]
impl AirQualityMonitor {
    /// Creates a monitor from an explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `.config(MonitorConfig)`: **Required.**
    /// * `.http(Client)`: Optional. Shared HTTP client; a default one is built otherwise.
    /// * `.granule_decoder(Arc<dyn GranuleDecoder>)`: Optional. Needed for satellite lookups.
    /// * `.record_store(Arc<dyn RecordStore>)`: Optional. Defaults to an in-memory store.
    /// * `.advice_generator(Arc<dyn AdviceGenerator>)`: Optional. Overrides the
    ///   OpenAI backend built from the configured keys.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingCredentials`] without OpenWeatherMap keys and
    /// [`MonitorError::DataDirResolution`] when no data directory is configured
    /// and the user cache dir can't be determined.
    #[builder]
    pub fn from_config(
        config: MonitorConfig,
        http: Option<Client>,
        granule_decoder: Option<Arc<dyn GranuleDecoder>>,
        record_store: Option<Arc<dyn RecordStore>>,
        advice_generator: Option<Arc<dyn AdviceGenerator>>,
    ) -> Result<Self, MonitorError> {
        let http = http.unwrap_or_default();
        let endpoints = &config.endpoints;
        let timeouts = &config.timeouts;

        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let advice_generator = advice_generator.or_else(|| {
            config.openai_credentials().map(|keys| {
                Arc::new(OpenAiAdviceGenerator::new(
                    http.clone(),
                    &endpoints.openai,
                    &config.openai_model,
                    keys,
                    timeouts.advice(),
                )) as Arc<dyn AdviceGenerator>
            })
        });

        let openweather = OpenWeatherClient::new(
            http.clone(),
            &endpoints.openweather,
            config.openweather_credentials()?,
            timeouts.pollution(),
            timeouts.geocoding(),
        );
        info!(
            "Monitor ready with {} OpenWeatherMap key(s), data dir {}",
            openweather.credential_count(),
            data_dir.display()
        );

        Ok(Self {
            satellite_search_days: config.satellite_search_days,
            climate_row_cap: config.climate_row_cap,
            open_meteo: OpenMeteoClient::new(http.clone(), &endpoints.open_meteo, timeouts.weather()),
            elevation: ElevationClient::new(http.clone(), &endpoints.elevation, timeouts.elevation()),
            earthdata: EarthdataClient::new(
                http.clone(),
                &endpoints.cmr,
                config.earthdata_credentials(),
                timeouts.satellite_search(),
                timeouts.satellite_download(),
            ),
            daymet: DaymetClient::new(http, &endpoints.daymet, timeouts.climate()),
            advice: AdviceService::new(advice_generator),
            granule_decoder,
            record_store: record_store.unwrap_or_else(|| Arc::new(InMemoryRecordStore::new())),
            openweather,
            data_dir,
        })
    }

    /// Creates a monitor configured from environment variables alone.
    ///
    /// # Errors
    ///
    /// See [`AirQualityMonitor::from_config()`].
    pub fn new() -> Result<Self, MonitorError> {
        Self::from_config().config(MonitorConfig::from_env()).call()
    }

    /// Directory satellite granules are downloaded to.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Name, status, version and the supported operations.
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            message: "Air Quality Monitor API",
            status: "running",
            version: env!("CARGO_PKG_VERSION"),
            operations: OPERATIONS.to_vec(),
        }
    }

    /// Fetches current or forecast air pollution at a location, trying every
    /// configured OpenWeatherMap key in order.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.mode(PollutionMode)`: Optional. Defaults to [`PollutionMode::Current`].
    ///
    /// # Errors
    ///
    /// [`MonitorError::Fetch`] when every key fails. The error carries the
    /// classification of the last key's failure.
    #[builder]
    pub async fn fetch_pollution(
        &self,
        location: LatLon,
        mode: Option<PollutionMode>,
    ) -> Result<PollutionReport, MonitorError> {
        validate_location(location)?;
        let mode = mode.unwrap_or(PollutionMode::Current);
        let fetched = self.openweather.air_pollution(location, mode).await?;
        Ok(PollutionReport {
            coordinates: location.into(),
            mode,
            data: fetched.value,
            source: openweather::SOURCE,
            credential_index_used: fetched.credential_index,
        })
    }

    /// Fetches the hourly pollution forecast and folds it into one aggregate
    /// per UTC day.
    ///
    /// # Errors
    ///
    /// As [`AirQualityMonitor::fetch_pollution`], plus [`MonitorError::NotFound`]
    /// when the provider returns no samples.
    #[builder]
    pub async fn fetch_daily_forecast(
        &self,
        location: LatLon,
    ) -> Result<DailyForecastReport, MonitorError> {
        validate_location(location)?;
        let fetched = self
            .openweather
            .air_pollution(location, PollutionMode::Forecast)
            .await?;

        let samples = fetched.value.samples();
        if samples.is_empty() {
            return Err(MonitorError::NotFound(format!(
                "no forecast samples for ({}, {})",
                location.0, location.1
            )));
        }
        let daily_forecast = aggregate(&samples);
        info!(
            "Aggregated {} forecast samples into {} days",
            samples.len(),
            daily_forecast.len()
        );

        Ok(DailyForecastReport {
            coordinates: location.into(),
            daily_forecast,
            raw_sample_count: samples.len(),
            source: openweather::SOURCE,
            credential_index_used: fetched.credential_index,
        })
    }

    /// Searches places by name.
    ///
    /// # Arguments
    ///
    /// * `.query(&str)`: **Required.** Place name, e.g. `"Albany"`.
    /// * `.limit(u8)`: Optional. Clamped to `1..=10`, defaults to `5`.
    /// * `.country(&str)`: Optional. ISO 3166 country code. With `"US"`,
    ///   display strings use state abbreviations.
    #[builder]
    pub async fn search_location(
        &self,
        query: &str,
        limit: Option<u8>,
        country: Option<&str>,
    ) -> Result<LocationSearchReport, MonitorError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MonitorError::InvalidInput(
                "search query must not be empty".to_string(),
            ));
        }
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        let results = self.openweather.geocode(query, limit, country).await?.value;
        Ok(LocationSearchReport {
            query: query.to_string(),
            count: results.len(),
            results,
        })
    }

    /// Fetches the hourly and daily weather forecast.
    #[builder]
    pub async fn fetch_weather_forecast(
        &self,
        location: LatLon,
    ) -> Result<WeatherForecastReport, MonitorError> {
        validate_location(location)?;
        let forecast = self.open_meteo.forecast(location).await?;
        Ok(WeatherForecastReport {
            coordinates: location.into(),
            forecast,
            source: open_meteo::SOURCE,
        })
    }

    /// Looks up the tropospheric column of a trace gas at a location.
    ///
    /// Searches the satellite catalog backward one day at a time from
    /// `end_date` for the configured number of days, downloads the last
    /// granule of the first day that has any, and reads the value of the valid
    /// cell nearest to `location`. The value is converted to per-m² and
    /// multiplied by the ground elevation into an estimated volume.
    ///
    /// # Arguments
    ///
    /// * `.gas(GasType)`: **Required.**
    /// * `.location(LatLon)`: **Required.**
    /// * `.start_date(NaiveDate)`: **Required.** Must not be after `end_date`.
    /// * `.end_date(NaiveDate)`: **Required.** First day searched.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::InvalidInput`] for a reversed date range.
    /// - [`ConfigError::MissingGranuleDecoder`] when no decoder was supplied.
    /// - [`crate::SatelliteError::NoGranules`] when no day in the window has data.
    /// - [`crate::SatelliteError::NoQualifyingPoints`] or
    ///   [`crate::SatelliteError::NoValidMeasurements`] when the granule has
    ///   no usable cell.
    #[builder]
    pub async fn fetch_satellite_gas(
        &self,
        gas: GasType,
        location: LatLon,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SatelliteGasReport, MonitorError> {
        validate_location(location)?;
        if start_date > end_date {
            return Err(MonitorError::InvalidInput(format!(
                "start_date {start_date} is after end_date {end_date}"
            )));
        }
        let decoder = self
            .granule_decoder
            .clone()
            .ok_or(ConfigError::MissingGranuleDecoder)?;

        let day = self
            .earthdata
            .find_latest(gas, end_date, location, self.satellite_search_days)
            .await?;
        let granule = day.latest().ok_or_else(|| {
            MonitorError::NotFound(format!("no {gas} granule listed for {}", day.date))
        })?;
        let granule_name = granule.file_name();

        ensure_data_dir_exists(&self.data_dir).await?;
        let destination = granule_path(&self.data_dir, gas, day.date, location, &granule_name);
        let path = self.earthdata.download(granule, &destination).await?;

        let nearest = tokio::task::spawn_blocking(move || {
            let grid = decoder.decode(&path)?;
            let points = grid.points()?;
            SatelliteLocator::new(grid.unit.clone(), grid.fill_value).locate(location, &points)
        })
        .await??;

        let elevation = self.elevation.elevation(location).await;
        let density = nearest.value / CM2_PER_M2;
        info!(
            "{} at ({}, {}) on {}: {:e} from a cell {:.4} deg away",
            gas, location.0, location.1, day.date, density, nearest.distance
        );

        Ok(SatelliteGasReport {
            gas_type: gas,
            gas_name: gas.description(),
            location: location.into(),
            start_date,
            end_date,
            data_date: day.date,
            granule: granule_name,
            tropospheric_column_density: density,
            column_unit: nearest.unit,
            estimated_volume: density * elevation.meters,
            elevation_m: elevation.meters,
            elevation_source: elevation.source,
            quality_points_used: nearest.candidates,
            quality_tier: nearest.quality_tier,
            nearest_point: LatLon(nearest.latitude, nearest.longitude).into(),
            distance_deg: nearest.distance,
            distance_km: nearest.distance_km,
        })
    }

    /// Fetches and parses a single-pixel climate export.
    ///
    /// The location is checked against the dataset's coverage box before any
    /// request is made. At most the configured row cap is returned in
    /// `daily_data`; `data_count` and the summary cover every row.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.**
    /// * `.variables(Vec<String>)`: Optional. All variables when empty or omitted.
    /// * `.period(ClimatePeriod)`: Optional. Every available year when omitted.
    ///
    /// # Errors
    ///
    /// [`MonitorError::OutOfCoverage`] outside the coverage box,
    /// [`MonitorError::Climate`] when the export can't be parsed.
    #[builder]
    pub async fn fetch_climate(
        &self,
        location: LatLon,
        variables: Option<Vec<String>>,
        period: Option<ClimatePeriod>,
    ) -> Result<ClimateReport, MonitorError> {
        validate_location(location)?;
        let query = ClimateQuery {
            variables: variables
                .unwrap_or_default()
                .into_iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
            period: period.unwrap_or(ClimatePeriod::Years(Vec::new())),
        };
        if let ClimatePeriod::DateRange { start, end } = query.period {
            if start > end {
                return Err(MonitorError::InvalidInput(format!(
                    "start {start} is after end {end}"
                )));
            }
        }

        let raw = self.daymet.single_pixel(location, &query).await?;
        let dataset = tokio::task::spawn_blocking(move || parser::parse(&raw)).await??;

        let data_count = dataset.rows.len();
        let mut daily_data = dataset.rows;
        daily_data.truncate(self.climate_row_cap);

        Ok(ClimateReport {
            location: location.into(),
            metadata: dataset.metadata,
            units: dataset.units,
            parameters: ClimateParameters {
                variables: query.variables,
                period: query.period,
            },
            data_count,
            summary_statistics: dataset.summary,
            truncated: daily_data.len() < data_count,
            daily_data,
        })
    }

    /// Health advice for a risk group at an AQI category.
    ///
    /// Uses the generative backend when one is configured and falls back to
    /// the built-in rule table otherwise, or when generation fails.
    ///
    /// # Arguments
    ///
    /// * `.aqi(u8)`: **Required.** AQI category, 1 to 5.
    /// * `.subject(&str)`: **Required.** Risk group label such as `"Children"`.
    /// * `.pollutant_levels(BTreeMap<String, f64>)`: Optional. Concentrations by pollutant key.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidInput`] when `aqi` is outside 1 to 5.
    #[builder]
    pub async fn generate_advice(
        &self,
        aqi: u8,
        subject: &str,
        pollutant_levels: Option<BTreeMap<String, f64>>,
    ) -> Result<AdviceReport, MonitorError> {
        let aqi = AqiCategory::from_u8(aqi).ok_or_else(|| {
            MonitorError::InvalidInput(format!("AQI category must be between 1 and 5, got {aqi}"))
        })?;
        let request = AdviceRequest {
            aqi,
            subject_label: subject.trim().to_string(),
            pollutant_levels,
        };
        let subject_category = request.subject();
        let advice = self.advice.advise(&request).await;
        Ok(AdviceReport::new(
            aqi,
            request.subject_label,
            subject_category,
            advice,
        ))
    }

    /// Persists an arbitrary JSON object in the configured record store.
    ///
    /// # Errors
    ///
    /// [`MonitorError::Store`] for an empty collection name or a document that
    /// isn't a JSON object.
    #[builder]
    pub async fn store_record(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> Result<StoredRecord, MonitorError> {
        let record = self.record_store.store(collection, document).await?;
        info!("Stored document {} in '{}'", record.document_id, collection.trim());
        Ok(record)
    }
}

fn validate_location(location: LatLon) -> Result<(), MonitorError> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(MonitorError::InvalidInput(format!(
            "({}, {}) is not a valid coordinate",
            location.0, location.1
        )))
    }
}
