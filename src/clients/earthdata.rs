//! NASA CMR granule search and Earthdata granule download.
//!
//! Search is anonymous. Downloads authenticate with bearer tokens, tried in
//! order through the credential fallback loop; the body is streamed into a
//! temporary file next to its final path and renamed into place once
//! complete.

use crate::clients::http;
use crate::error::MonitorError;
use crate::fallback::credential_list::CredentialList;
use crate::fallback::error::FailureKind;
use crate::fallback::fetcher::FallbackFetcher;
use crate::satellite::error::SatelliteError;
use crate::types::gas::GasType;
use crate::types::location::LatLon;
use chrono::{Duration as ChronoDuration, NaiveDate};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

pub const CMR_PROVIDER: &str = "NASA CMR";
pub const DOWNLOAD_PROVIDER: &str = "NASA Earthdata";

/// Collection version searched for.
pub const COLLECTION_VERSION: &str = "V03";

const DATA_LINK_REL: &str = "http://esipfed.org/ns/fedsearch/1.1/data#";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<GranuleEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GranuleEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub links: Vec<GranuleLink>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GranuleLink {
    pub href: String,
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub inherited: bool,
}

impl GranuleEntry {
    /// The first direct data link of this granule, excluding collection-level links.
    pub fn data_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == DATA_LINK_REL && !l.inherited && l.href.starts_with("http"))
            .map(|l| l.href.as_str())
    }

    /// File name of the data link, falling back to the title.
    pub fn file_name(&self) -> String {
        self.data_link()
            .and_then(|href| href.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.title.clone())
    }
}

/// Granules found for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyGranules {
    pub date: NaiveDate,
    pub granules: Vec<GranuleEntry>,
}

impl DailyGranules {
    /// The last granule listed for the day.
    pub fn latest(&self) -> Option<&GranuleEntry> {
        self.granules.last()
    }
}

pub struct EarthdataClient {
    http: Client,
    cmr_base_url: String,
    tokens: Option<CredentialList>,
    fetcher: FallbackFetcher,
    search_timeout: Duration,
    download_timeout: Duration,
}

impl EarthdataClient {
    pub fn new(
        http: Client,
        cmr_base_url: &str,
        tokens: Option<CredentialList>,
        search_timeout: Duration,
        download_timeout: Duration,
    ) -> Self {
        Self {
            http,
            cmr_base_url: cmr_base_url.trim_end_matches('/').to_string(),
            tokens,
            fetcher: FallbackFetcher::new(DOWNLOAD_PROVIDER),
            search_timeout,
            download_timeout,
        }
    }

    /// Searches the level-3 collection of `gas` for granules covering
    /// `location` on `date` (00:00:00 to 23:59:59 UTC).
    pub async fn search(
        &self,
        gas: GasType,
        date: NaiveDate,
        location: LatLon,
    ) -> Result<Vec<GranuleEntry>, MonitorError> {
        let day = date.format("%Y-%m-%d");
        let request = self
            .http
            .get(format!("{}/search/granules.json", self.cmr_base_url))
            .query(&[
                ("short_name", gas.short_name()),
                ("version", COLLECTION_VERSION.to_string()),
                ("temporal", format!("{day}T00:00:00Z,{day}T23:59:59Z")),
                // CMR points are lon,lat.
                ("point", format!("{},{}", location.1, location.0)),
                ("page_size", "100".to_string()),
            ])
            .timeout(self.search_timeout);

        let body = http::text(request)
            .await
            .map_err(http::upstream(CMR_PROVIDER))?;
        let response: SearchResponse = http::decode(CMR_PROVIDER, &body)?;
        debug!(
            "{} granules for {} on {}",
            response.feed.entry.len(),
            gas.short_name(),
            day
        );
        Ok(response.feed.entry)
    }

    /// Walks backward one day at a time from `end_date`, at most `max_days`
    /// days, and returns the first day with any granule.
    ///
    /// # Errors
    ///
    /// [`SatelliteError::NoGranules`] when none of the days has data.
    pub async fn find_latest(
        &self,
        gas: GasType,
        end_date: NaiveDate,
        location: LatLon,
        max_days: u32,
    ) -> Result<DailyGranules, MonitorError> {
        for offset in 0..max_days {
            let Some(date) = end_date.checked_sub_signed(ChronoDuration::days(i64::from(offset)))
            else {
                break;
            };
            let granules = self.search(gas, date, location).await?;
            if !granules.is_empty() {
                info!("Found {} {} granules for {}", granules.len(), gas, date);
                return Ok(DailyGranules { date, granules });
            }
        }
        Err(SatelliteError::NoGranules {
            gas,
            end_date,
            days: max_days,
        }
        .into())
    }

    /// Downloads `granule` to `destination` unless the file already exists.
    ///
    /// # Errors
    ///
    /// [`crate::ConfigError::MissingCredentials`] without tokens,
    /// [`MonitorError::Fetch`] when every token is rejected and
    /// [`SatelliteError::GranuleWrite`] when the file can't be written.
    pub async fn download(
        &self,
        granule: &GranuleEntry,
        destination: &Path,
    ) -> Result<PathBuf, MonitorError> {
        if tokio::fs::metadata(destination).await.is_ok() {
            info!("Granule already downloaded at {}", destination.display());
            return Ok(destination.to_path_buf());
        }

        let tokens = self
            .tokens
            .as_ref()
            .ok_or(crate::config::ConfigError::MissingCredentials {
                provider: DOWNLOAD_PROVIDER,
                env_var: crate::config::ENV_EARTHDATA_TOKENS,
            })?;
        let url = granule
            .data_link()
            .ok_or_else(|| SatelliteError::MissingDownloadLink(granule.id.clone()))?;

        info!("Downloading granule {} from {}", granule.id, url);
        let response = self
            .fetcher
            .fetch(tokens, |token| {
                let request = self
                    .http
                    .get(url)
                    .bearer_auth(token)
                    .timeout(self.download_timeout);
                http::send(request)
            })
            .await
            .into_result()?
            .value;

        stream_to_file(response, destination).await?;
        info!("Saved granule to {}", destination.display());
        Ok(destination.to_path_buf())
    }
}

async fn stream_to_file(response: Response, destination: &Path) -> Result<(), MonitorError> {
    let write_error = |e: io::Error| SatelliteError::GranuleWrite(destination.to_path_buf(), e);
    let dir = destination.parent().unwrap_or_else(|| Path::new("."));

    let temp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dir)
        .map_err(write_error)?;
    let (file, temp_path) = temp.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let stream = response.bytes_stream().map_err(io::Error::other);
    let mut reader = StreamReader::new(stream);
    if let Err(e) = tokio::io::copy(&mut reader, &mut file).await {
        // A body error surfaces as io::Error wrapping the reqwest error.
        if let Some(source) = e.get_ref().and_then(|inner| inner.downcast_ref::<reqwest::Error>()) {
            warn!("Granule body transfer failed: {}", source);
            return Err(MonitorError::Upstream {
                provider: DOWNLOAD_PROVIDER.to_string(),
                failure: FailureKind::from_reqwest(source),
            });
        }
        return Err(write_error(e).into());
    }
    file.flush().await.map_err(write_error)?;
    drop(file);

    temp_path
        .persist(destination)
        .map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(id: &str, href: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": format!("{id}.nc"),
            "links": [
                {"href": "https://example.org/collection", "rel": DATA_LINK_REL, "inherited": true},
                {"href": href, "rel": DATA_LINK_REL}
            ]
        })
    }

    fn client(server: &MockServer, tokens: Option<&[&str]>) -> EarthdataClient {
        EarthdataClient::new(
            Client::new(),
            &server.uri(),
            tokens.map(|t| CredentialList::new(t.iter().copied()).unwrap()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_data_link_skips_inherited() {
        let granule: GranuleEntry = serde_json::from_value(entry(
            "G1",
            "https://data.example.org/TEMPO_NO2_L3_V03_20240801T1200Z_S003.nc",
        ))
        .unwrap();
        assert_eq!(
            granule.data_link(),
            Some("https://data.example.org/TEMPO_NO2_L3_V03_20240801T1200Z_S003.nc")
        );
        assert_eq!(granule.file_name(), "TEMPO_NO2_L3_V03_20240801T1200Z_S003.nc");
    }

    #[tokio::test]
    async fn test_walks_backward_until_granules_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/granules.json"))
            .and(query_param("temporal", "2024-08-01T00:00:00Z,2024-08-01T23:59:59Z"))
            .and(query_param("short_name", "TEMPO_NO2_L3"))
            .and(query_param("point", "-74,40.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "feed": {"entry": [entry("G1", "https://x/a.nc"), entry("G2", "https://x/b.nc")]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/granules.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"feed": {"entry": []}})),
            )
            .mount(&server)
            .await;

        let end = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
        let found = client(&server, None)
            .find_latest(GasType::No2, end, LatLon(40.7, -74.0), 30)
            .await
            .unwrap();
        assert_eq!(found.date, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(found.latest().map(|g| g.id.as_str()), Some("G2"));
        // Aug 3, Aug 2, Aug 1.
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_no_granules_within_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"feed": {"entry": []}})),
            )
            .mount(&server)
            .await;

        let end = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
        let result = client(&server, None)
            .find_latest(GasType::Hcho, end, LatLon(40.7, -74.0), 5)
            .await;
        assert!(matches!(
            result,
            Err(MonitorError::Satellite(SatelliteError::NoGranules { days: 5, .. }))
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_download_falls_back_to_next_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/granules/g.nc"))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"netcdf-bytes".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/granules/g.nc"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let granule: GranuleEntry =
            serde_json::from_value(entry("G", &format!("{}/granules/g.nc", server.uri()))).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("NO2_g.nc");

        let saved = client(&server, Some(&["expired", "good"][..]))
            .download(&granule, &destination)
            .await
            .unwrap();
        assert_eq!(saved, destination);
        assert_eq!(std::fs::read(&destination).unwrap(), b"netcdf-bytes");
        // No partial files are left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_download_without_tokens_is_config_error() {
        let server = MockServer::start().await;
        let granule: GranuleEntry = serde_json::from_value(entry("G", "https://x/g.nc")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = client(&server, None)
            .download(&granule, &dir.path().join("g.nc"))
            .await;
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }
}
