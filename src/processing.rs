use crate::types::Observation;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Collapses the raw rows to one row per (country, year), averaging every
/// indicator field. Groups come out in first-appearance order, so two runs
/// over the same input produce identical output.
pub fn aggregate(rows: &[Observation]) -> Vec<Observation> {
    let mut order: Vec<(String, i32)> = Vec::new();
    let mut groups: HashMap<(String, i32), Vec<&Observation>> = HashMap::new();

    for row in rows {
        let key = (row.country.clone(), row.year);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        let members = &groups[&key];
        let n = members.len() as f64;
        let mean = |field: fn(&Observation) -> f64| -> f64 {
            members.iter().map(|o| field(o)).sum::<f64>() / n
        };
        out.push(Observation {
            country: key.0,
            year: key.1,
            gdp: mean(|o| o.gdp),
            gdp_per_capita: mean(|o| o.gdp_per_capita),
            public_expense: mean(|o| o.public_expense),
            expense_per_capita: mean(|o| o.expense_per_capita),
            cpi: mean(|o| o.cpi),
            population: mean(|o| o.population),
        });
    }

    debug!(input = rows.len(), groups = out.len(), "aggregated dataset");
    out
}

/// Restricts rows to the selected years, preserving input order. An empty
/// selection keeps nothing: the filter reads strictly as set membership,
/// and the page tells the user so rather than guessing "all years".
pub fn filter_years(rows: &[Observation], years: &BTreeSet<i32>) -> Vec<Observation> {
    rows.iter()
        .filter(|row| years.contains(&row.year))
        .cloned()
        .collect()
}

/// Distinct years present in the rows, ascending.
pub fn distinct_years(rows: &[Observation]) -> Vec<i32> {
    let years: BTreeSet<i32> = rows.iter().map(|row| row.year).collect();
    years.into_iter().collect()
}
