use crate::types::{GeoCoded, Observation};
use tracing::warn;

/// Country names as they appear in the dataset, in Spanish. The ISO
/// registry only carries English names, so the region's spellings are
/// aliased explicitly; anything else falls through to a case-insensitive
/// scan of the registry.
const SPANISH_ALIASES: &[(&str, &str)] = &[
    ("argentina", "ARG"),
    ("bolivia", "BOL"),
    ("brasil", "BRA"),
    ("chile", "CHL"),
    ("colombia", "COL"),
    ("costa rica", "CRI"),
    ("cuba", "CUB"),
    ("ecuador", "ECU"),
    ("el salvador", "SLV"),
    ("guatemala", "GTM"),
    ("haití", "HTI"),
    ("honduras", "HND"),
    ("méxico", "MEX"),
    ("mexico", "MEX"),
    ("nicaragua", "NIC"),
    ("panamá", "PAN"),
    ("panama", "PAN"),
    ("paraguay", "PRY"),
    ("perú", "PER"),
    ("peru", "PER"),
    ("puerto rico", "PRI"),
    ("república dominicana", "DOM"),
    ("uruguay", "URY"),
    ("venezuela", "VEN"),
];

/// Resolves a country name to its ISO alpha-3 code. Unknown names return
/// `None`; they keep their table rows and just never shade on the map.
pub fn resolve(name: &str) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(code) = SPANISH_ALIASES
        .iter()
        .copied()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, code)| code)
    {
        return Some(code);
    }
    rust_iso3166::ALL
        .iter()
        .find(|entry| entry.name.to_lowercase() == needle)
        .map(|entry| entry.alpha3)
}

/// Attaches codes row by row. Resolution failures are independent: one
/// unknown name never affects any other row.
pub fn geocode(rows: Vec<Observation>) -> Vec<GeoCoded> {
    rows.into_iter()
        .map(|obs| {
            let code = resolve(&obs.country);
            if code.is_none() {
                warn!(country = %obs.country, "country name did not resolve to an alpha-3 code");
            }
            GeoCoded { obs, code }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spanish_names() {
        assert_eq!(resolve("Perú"), Some("PER"));
        assert_eq!(resolve("Brasil"), Some("BRA"));
        assert_eq!(resolve("México"), Some("MEX"));
        assert_eq!(resolve("República Dominicana"), Some("DOM"));
    }

    #[test]
    fn resolves_english_registry_names() {
        assert_eq!(resolve("Chile"), Some("CHL"));
        assert_eq!(resolve("Uruguay"), Some("URY"));
    }

    #[test]
    fn resolution_is_case_insensitive_and_trims() {
        assert_eq!(resolve("  chile "), Some("CHL"));
        assert_eq!(resolve("BRASIL"), Some("BRA"));
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        assert_eq!(resolve("Atlantis"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn failures_stay_local_to_the_row() {
        let rows = vec![
            Observation {
                country: "Atlantis".to_string(),
                year: 2020,
                gdp: 10.0,
                gdp_per_capita: 0.0,
                public_expense: 0.0,
                expense_per_capita: 0.0,
                cpi: 0.0,
                population: 0.0,
            },
            Observation {
                country: "Chile".to_string(),
                year: 2020,
                gdp: 100.0,
                gdp_per_capita: 0.0,
                public_expense: 0.0,
                expense_per_capita: 0.0,
                cpi: 0.0,
                population: 0.0,
            },
        ];
        let coded = geocode(rows);
        assert_eq!(coded[0].code, None);
        assert_eq!(coded[1].code, Some("CHL"));
        // the unresolved row keeps its values
        assert_eq!(coded[0].obs.gdp, 10.0);
    }
}
