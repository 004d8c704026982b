use crate::processing::distinct_years;
use crate::types::{Indicator, Observation};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One ranked table row. `cells` lines up with `IndicatorTable::years`;
/// a `None` cell means the country has no record for that year and renders
/// blank, never as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub country: String,
    pub cells: Vec<Option<String>>,
    pub average: String,
}

/// Country × year pivot of one indicator, ranked descending by the
/// per-country average. Every cell is already formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub years: Vec<i32>,
    pub rows: Vec<TableRow>,
}

/// Pivot → average → rank → format, the pipeline every indicator section
/// runs. Duplicate (country, year) rows should not survive aggregation,
/// but if the caller skipped it the first value seen wins.
pub fn build_table(rows: &[Observation], indicator: Indicator) -> IndicatorTable {
    let years = distinct_years(rows);

    let mut countries: Vec<String> = Vec::new();
    let mut values: HashMap<(String, i32), f64> = HashMap::new();
    for obs in rows {
        if !countries.iter().any(|c| c == &obs.country) {
            countries.push(obs.country.clone());
        }
        values
            .entry((obs.country.clone(), obs.year))
            .or_insert_with(|| indicator.value(obs));
    }

    // The average counts only the years the country actually has; missing
    // cells stay out of the denominator.
    let mut ranked: Vec<(String, Vec<Option<f64>>, Option<f64>)> = countries
        .into_iter()
        .map(|country| {
            let cells: Vec<Option<f64>> = years
                .iter()
                .map(|&year| values.get(&(country.clone(), year)).copied())
                .collect();
            let present: Vec<f64> = cells.iter().flatten().copied().collect();
            let average = if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            };
            (country, cells, average)
        })
        .collect();

    // sort_by is stable, so tied averages keep their original relative order
    ranked.sort_by(|a, b| match (a.2, b.2) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let rows = ranked
        .into_iter()
        .map(|(country, cells, average)| TableRow {
            country,
            cells: cells
                .into_iter()
                .map(|cell| cell.map(|v| indicator.format(v)))
                .collect(),
            average: average.map(|v| indicator.format(v)).unwrap_or_default(),
        })
        .collect();

    IndicatorTable { years, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(country: &str, year: i32, gdp: f64) -> Observation {
        Observation {
            country: country.to_string(),
            year,
            gdp,
            gdp_per_capita: 0.0,
            public_expense: 0.0,
            expense_per_capita: 0.0,
            cpi: 0.0,
            population: 0.0,
        }
    }

    #[test]
    fn rows_rank_descending_by_average() {
        let rows = vec![
            obs("Peru", 2020, 50.0),
            obs("Chile", 2020, 150.0),
            obs("Bolivia", 2020, 90.0),
        ];
        let table = build_table(&rows, Indicator::Gdp);
        let order: Vec<&str> = table.rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["Chile", "Bolivia", "Peru"]);
    }

    #[test]
    fn tied_averages_keep_original_relative_order() {
        let rows = vec![
            obs("Uruguay", 2020, 70.0),
            obs("Paraguay", 2020, 70.0),
            obs("Chile", 2020, 150.0),
        ];
        let table = build_table(&rows, Indicator::Gdp);
        let order: Vec<&str> = table.rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["Chile", "Uruguay", "Paraguay"]);
    }

    #[test]
    fn missing_years_stay_out_of_the_average_denominator() {
        let rows = vec![
            obs("Chile", 2020, 100.0),
            obs("Peru", 2020, 80.0),
            obs("Peru", 2021, 120.0),
        ];
        let table = build_table(&rows, Indicator::Gdp);
        let chile = table.rows.iter().find(|r| r.country == "Chile").unwrap();
        // 100 over one present year, not 50 over two
        assert_eq!(chile.average, "$100");
        assert_eq!(chile.cells, vec![Some("$100".to_string()), None]);
    }

    #[test]
    fn missing_cells_render_blank_not_zero() {
        let rows = vec![obs("Chile", 2020, 100.0), obs("Peru", 2021, 80.0)];
        let table = build_table(&rows, Indicator::Gdp);
        assert_eq!(table.years, vec![2020, 2021]);
        let peru = table.rows.iter().find(|r| r.country == "Peru").unwrap();
        assert_eq!(peru.cells[0], None);
        assert_eq!(peru.cells[1], Some("$80".to_string()));
    }

    #[test]
    fn duplicate_country_year_takes_first_value_seen() {
        // can only happen when aggregation was skipped
        let rows = vec![obs("Chile", 2020, 100.0), obs("Chile", 2020, 999.0)];
        let table = build_table(&rows, Indicator::Gdp);
        assert_eq!(table.rows[0].cells[0], Some("$100".to_string()));
    }

    #[test]
    fn cells_use_the_indicator_formatting_rule() {
        let mut row = obs("Chile", 2020, 0.0);
        row.cpi = 0.0523;
        row.population = 1.5;
        let cpi_table = build_table(std::slice::from_ref(&row), Indicator::Cpi);
        assert_eq!(cpi_table.rows[0].cells[0], Some("5.23%".to_string()));
        let pop_table = build_table(std::slice::from_ref(&row), Indicator::Population);
        assert_eq!(pop_table.rows[0].cells[0], Some("1,500,000".to_string()));
        assert_eq!(pop_table.rows[0].average, "1,500,000");
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = build_table(&[], Indicator::Gdp);
        assert!(table.years.is_empty());
        assert!(table.rows.is_empty());
    }
}
