use crate::batch::Pacer;
use crate::config::GeocodeConfig;
use crate::error::GeocodingError;
use crate::utils::Table;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Maps a free-text address to coordinates. `Ok(None)` means the service
/// found nothing for it.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodingError>;
}

/// Google Maps Geocoding API client.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocodeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/maps/api/geocode/json",
                config.api_base_url.trim_end_matches('/')
            ),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodingError> {
        let response: GeocodeResponse = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        interpret(response)
    }
}

fn interpret(response: GeocodeResponse) -> Result<Option<Coordinates>, GeocodingError> {
    match response.status.as_str() {
        "OK" => response
            .results
            .first()
            .map(|r| {
                Some(Coordinates {
                    lat: r.geometry.location.lat,
                    lng: r.geometry.location.lng,
                })
            })
            .ok_or(GeocodingError::InvalidResponse),
        "ZERO_RESULTS" => Ok(None),
        _ => Err(GeocodingError::Api {
            message: response.error_message.unwrap_or_default(),
            status: response.status,
        }),
    }
}

/// Postal address for one row, suffixed so the lookup stays inside the city.
pub fn build_address(calle: &str, colonia: &str, cp: &str, suffix: &str) -> String {
    format!("{}, {}, {}, {}", calle, colonia, cp, suffix)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeocodeReport {
    pub found: usize,
    pub missing: usize,
}

/// Adds `latitud`/`longitud` to every row of `table`.
///
/// Rows the service cannot place keep empty coordinates; no row is ever dropped.
pub async fn enrich_coordinates(
    table: &mut Table,
    geocoder: &dyn Geocoder,
    address_suffix: &str,
    request_delay: Duration,
) -> GeocodeReport {
    let lat_col = table.ensure_column("latitud");
    let lng_col = table.ensure_column("longitud");
    let total = table.len();
    let mut pacer = Pacer::new(request_delay);
    let mut report = GeocodeReport::default();

    println!("🔍 Procesando {} museos...\n", total);

    for idx in 0..total {
        pacer.tick().await;
        let address = build_address(
            table.get(idx, "calle"),
            table.get(idx, "colonia"),
            table.get(idx, "cp"),
            address_suffix,
        );
        println!("[{}/{}] {}", idx + 1, total, table.get(idx, "nombre_oficial"));
        println!("  📍 Dirección: {}", address);

        let coordinates = match geocoder.geocode(&address).await {
            Ok(Some(c)) => Some(c),
            Ok(None) => {
                warn!(%address, "no geocoding results");
                None
            }
            Err(e) => {
                warn!(%address, error = %e, "geocoding failed");
                None
            }
        };

        let row = &mut table.rows[idx];
        match coordinates {
            Some(c) => {
                debug!(lat = c.lat, lng = c.lng, "geocoded");
                row[lat_col] = c.lat.to_string();
                row[lng_col] = c.lng.to_string();
                report.found += 1;
                println!("  ✅ Coordenadas: {:.6}, {:.6}\n", c.lat, c.lng);
            }
            None => {
                row[lat_col].clear();
                row[lng_col].clear();
                report.missing += 1;
                println!("  ⚠️  No se obtuvieron coordenadas\n");
            }
        }
    }

    report
}
