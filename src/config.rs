use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Semicolon-delimited indicator dataset.
    pub data_csv: PathBuf,
    /// GeoJSON FeatureCollection with one feature per country.
    pub boundaries: PathBuf,
    /// Feature property holding the ISO alpha-3 code.
    #[serde(default = "default_code_property")]
    pub code_property: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub intro: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Análisis Económico: Más Allá del PIB".to_string(),
            intro: "Bienvenido a este complemento del informe de análisis económico, \
                    donde se analizan diversos indicadores para medir la economía de \
                    los países de América Latina, más allá del tradicional Producto \
                    Interno Bruto (PIB). El color en el mapa determina qué países \
                    tienen los valores más altos y cuáles los más bajos."
                .to_string(),
        }
    }
}

/// Viewport for the choropleths, in lon/lat degrees. Defaults cover the
/// Latin American scope of the dataset.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            lon_min: -120.0,
            lon_max: -30.0,
            lat_min: -60.0,
            lat_max: 35.0,
            width: 640,
            height: 640,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination of the static dashboard written by `render`.
    pub html_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html_path: PathBuf::from("dashboard.html"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

fn default_code_property() -> String {
    "ISO_A3".to_string()
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
