use num_format::{Locale, ToFormattedString};
use thiserror::Error;

/// One (country, year) row of the indicator dataset. Raw CSV rows and
/// aggregated rows share this shape; aggregation only collapses duplicate
/// (country, year) keys into means.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub country: String,
    pub year: i32,
    /// GDP in millions of currency units.
    pub gdp: f64,
    pub gdp_per_capita: f64,
    /// Public expenditure in millions of currency units.
    pub public_expense: f64,
    pub expense_per_capita: f64,
    /// Consumer price index stored as a fraction (0.05 = 5%).
    pub cpi: f64,
    /// Population in millions.
    pub population: f64,
}

/// Observation joined with its ISO alpha-3 code. `None` means the country
/// name was not recognized; the row still appears in tables, it just gets
/// no shading on the map.
#[derive(Debug, Clone)]
pub struct GeoCoded {
    pub obs: Observation,
    pub code: Option<&'static str>,
}

/// Country outline loaded from the boundaries GeoJSON, joined by alpha-3
/// code. Rings are exterior (lon, lat) rings, one per polygon part.
#[derive(Debug, Clone)]
pub struct CountryShape {
    pub code: String,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// Typed load-time failures. Anything here is fatal: the whole dashboard
/// depends on the fixed schema, so no partial render is attempted.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("required column '{0}' not found in dataset")]
    MissingColumn(String),
    #[error("row {row}: cannot parse '{value}' in column '{column}' as a number")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("dataset contains no data rows")]
    Empty,
}

/// The six dashboard indicators. Each knows its CSV column label, its
/// section title, and its display formatting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Gdp,
    GdpPerCapita,
    PublicExpense,
    ExpensePerCapita,
    Cpi,
    Population,
}

impl Indicator {
    pub const ALL: [Indicator; 6] = [
        Indicator::Gdp,
        Indicator::GdpPerCapita,
        Indicator::PublicExpense,
        Indicator::ExpensePerCapita,
        Indicator::Cpi,
        Indicator::Population,
    ];

    /// Column label in the source CSV. Labels are fixed, case- and
    /// accent-sensitive.
    pub fn column(self) -> &'static str {
        match self {
            Indicator::Gdp => "PIB M$",
            Indicator::GdpPerCapita => "PIB PER CAPITA",
            Indicator::PublicExpense => "GASTO PUBLICO M$",
            Indicator::ExpensePerCapita => "GASTO PER CAPITA",
            Indicator::Cpi => "IPC %",
            Indicator::Population => "POBLACION",
        }
    }

    /// Section heading shown above the indicator's map and table.
    pub fn title(self) -> &'static str {
        match self {
            Indicator::Gdp => "PIB Latinoamérica",
            Indicator::GdpPerCapita => "PIB per Cápita",
            Indicator::PublicExpense => "Gasto Público",
            Indicator::ExpensePerCapita => "Gasto Público per Cápita",
            Indicator::Cpi => "Índice de Precios al Consumidor",
            Indicator::Population => "Población",
        }
    }

    /// Stable identifier used in element ids and the frame-slider script.
    pub fn slug(self) -> &'static str {
        match self {
            Indicator::Gdp => "gdp",
            Indicator::GdpPerCapita => "gdp-per-capita",
            Indicator::PublicExpense => "public-expense",
            Indicator::ExpensePerCapita => "expense-per-capita",
            Indicator::Cpi => "cpi",
            Indicator::Population => "population",
        }
    }

    pub fn value(self, obs: &Observation) -> f64 {
        match self {
            Indicator::Gdp => obs.gdp,
            Indicator::GdpPerCapita => obs.gdp_per_capita,
            Indicator::PublicExpense => obs.public_expense,
            Indicator::ExpensePerCapita => obs.expense_per_capita,
            Indicator::Cpi => obs.cpi,
            Indicator::Population => obs.population,
        }
    }

    /// Formats a raw stored value for display. Strings produced here are
    /// terminal: nothing downstream does arithmetic on them.
    pub fn format(self, value: f64) -> String {
        match self {
            Indicator::Gdp
            | Indicator::GdpPerCapita
            | Indicator::PublicExpense
            | Indicator::ExpensePerCapita => {
                format!("${}", thousands(value))
            }
            Indicator::Cpi => format!("{:.2}%", value * 100.0),
            // Stored in millions; shown as an absolute count.
            Indicator::Population => thousands(value * 1_000_000.0),
        }
    }
}

fn thousands(value: f64) -> String {
    (value.round() as i64).to_formatted_string(&Locale::en)
}
