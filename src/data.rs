use crate::types::{CountryShape, DataError, Indicator, Observation};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::GeoJson;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

pub const COUNTRY_COL: &str = "PAIS";
pub const YEAR_COL: &str = "AÑO";

/// Loads the indicator dataset. Any schema or parse problem is fatal here,
/// before anything renders.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open dataset: {:?}", path))?;
    let observations = read_observations(file)
        .with_context(|| format!("Failed to load dataset: {:?}", path))?;
    info!(rows = observations.len(), "loaded dataset");
    Ok(observations)
}

/// Parses semicolon-delimited indicator rows from any reader. Split out of
/// the file loader so tests can feed in-memory CSV.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new().delimiter(b';').from_reader(reader);
    let headers = rdr.headers()?.clone();

    let country_idx = column_index(&headers, COUNTRY_COL)?;
    let year_idx = column_index(&headers, YEAR_COL)?;
    let value_indices: Vec<(Indicator, usize)> = Indicator::ALL
        .iter()
        .map(|&ind| Ok((ind, column_index(&headers, ind.column())?)))
        .collect::<Result<_>>()?;

    let mut observations = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1, so data row i sits on line i + 2.
        let line = i + 2;

        let country = record.get(country_idx).unwrap_or("").trim().to_string();
        if country.is_empty() {
            continue;
        }

        let year: i32 = parse_cell(&record, year_idx, YEAR_COL, line)? as i32;

        let mut obs = Observation {
            country,
            year,
            gdp: 0.0,
            gdp_per_capita: 0.0,
            public_expense: 0.0,
            expense_per_capita: 0.0,
            cpi: 0.0,
            population: 0.0,
        };
        for &(indicator, idx) in &value_indices {
            let value = parse_cell(&record, idx, indicator.column(), line)?;
            match indicator {
                Indicator::Gdp => obs.gdp = value,
                Indicator::GdpPerCapita => obs.gdp_per_capita = value,
                Indicator::PublicExpense => obs.public_expense = value,
                Indicator::ExpensePerCapita => obs.expense_per_capita = value,
                Indicator::Cpi => obs.cpi = value,
                Indicator::Population => obs.population = value,
            }
        }
        observations.push(obs);
    }

    if observations.is_empty() {
        return Err(DataError::Empty.into());
    }

    Ok(observations)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

fn parse_cell(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    line: usize,
) -> Result<f64, DataError> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.replace(',', ".").parse::<f64>().map_err(|_| {
        DataError::BadNumber {
            row: line,
            column: column.to_string(),
            value: raw.to_string(),
        }
    })
}

/// Loads country outlines from a GeoJSON FeatureCollection, keyed by the
/// configured alpha-3 property. Features without the property or without
/// polygon geometry are skipped; they simply never shade.
pub fn load_boundaries(path: &Path, code_property: &str) -> Result<Vec<CountryShape>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open boundaries: {:?}", path))?;
    let geojson =
        GeoJson::from_reader(BufReader::new(file)).context("Failed to parse boundaries GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundaries must be a FeatureCollection")),
    };

    let mut shapes = Vec::new();

    for feature in collection.features {
        let code = match feature
            .properties
            .as_ref()
            .and_then(|props| props.get(code_property))
        {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => continue,
        };

        let geometry = match feature.geometry {
            Some(g) => g,
            None => continue,
        };
        let converted: geo::Geometry<f64> = match geometry.value.try_into() {
            Ok(g) => g,
            Err(_) => continue,
        };
        let rings = match converted {
            geo::Geometry::Polygon(p) => exterior_rings(&MultiPolygon::new(vec![p])),
            geo::Geometry::MultiPolygon(mp) => exterior_rings(&mp),
            _ => continue,
        };

        shapes.push(CountryShape { code, rings });
    }

    info!(countries = shapes.len(), "loaded boundaries");
    Ok(shapes)
}

fn exterior_rings(mp: &MultiPolygon<f64>) -> Vec<Vec<(f64, f64)>> {
    mp.0.iter()
        .map(|poly| poly.exterior().coords().map(|c| (c.x, c.y)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataError;

    const HEADER: &str =
        "PAIS;AÑO;PIB M$;PIB PER CAPITA;GASTO PUBLICO M$;GASTO PER CAPITA;IPC %;POBLACION";

    fn csv_with(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s
    }

    #[test]
    fn reads_semicolon_rows() {
        let csv = csv_with(&["Chile;2020;100;5000;40;2000;0.03;19.1"]);
        let obs = read_observations(csv.as_bytes()).unwrap();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].country, "Chile");
        assert_eq!(obs[0].year, 2020);
        assert_eq!(obs[0].gdp, 100.0);
        assert_eq!(obs[0].cpi, 0.03);
        assert_eq!(obs[0].population, 19.1);
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "PAIS;AÑO;PIB M$\nChile;2020;100";
        let err = read_observations(csv.as_bytes()).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert!(matches!(data_err, DataError::MissingColumn(c) if c == "PIB PER CAPITA"));
    }

    #[test]
    fn unparseable_number_is_fatal_and_names_the_cell() {
        let csv = csv_with(&["Chile;2020;not-a-number;5000;40;2000;0.03;19.1"]);
        let err = read_observations(csv.as_bytes()).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        match data_err {
            DataError::BadNumber { row, column, value } => {
                assert_eq!(*row, 2);
                assert_eq!(column, "PIB M$");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decimal_comma_is_accepted() {
        let csv = csv_with(&["Chile;2020;100,5;5000;40;2000;0,03;19,1"]);
        let obs = read_observations(csv.as_bytes()).unwrap();
        assert_eq!(obs[0].gdp, 100.5);
        assert_eq!(obs[0].cpi, 0.03);
    }

    #[test]
    fn empty_dataset_is_fatal() {
        let err = read_observations(HEADER.as_bytes()).unwrap_err();
        let data_err = err.downcast_ref::<DataError>().unwrap();
        assert!(matches!(data_err, DataError::Empty));
    }
}
