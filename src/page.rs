use crate::config::AppConfig;
use crate::geocode;
use crate::processing;
use crate::render::{self, MapFrames};
use crate::table::{self, IndicatorTable};
use crate::types::{CountryShape, Indicator, Observation};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::time::Instant;
use tracing::debug;

const STYLE: &str = r#"
body { margin: 0; font-family: sans-serif; color: #222; display: flex; }
aside { width: 13rem; min-height: 100vh; padding: 1rem; background: #f0f2f6; }
aside ul { list-style: none; padding: 0; }
main { flex: 1; padding: 1rem 2rem; max-width: 52rem; }
table { border-collapse: collapse; margin: 1rem 0 2rem; width: 100%; }
th, td { border: 1px solid #ddd; padding: 0.3rem 0.6rem; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.frame { display: none; }
.frame.active { display: block; }
.legend-bar { height: 0.7rem; }
.legend { display: flex; justify-content: space-between; font-size: 0.8rem; max-width: 40rem; }
.slider { display: flex; gap: 0.6rem; align-items: center; margin: 0.4rem 0; }
"#;

const SCRIPT: &str = r#"
function showFrame(key, idx) {
  var frames = document.querySelectorAll('.frame-' + key);
  frames.forEach(function (el, i) {
    el.classList.toggle('active', i === Number(idx));
  });
  var label = document.getElementById(key + '-year');
  if (label && frames[idx]) { label.textContent = frames[idx].dataset.year; }
}
"#;

/// One full recomputation pass: filter → geocode → (map + table) per
/// indicator → page. The aggregated dataset and the boundaries come from
/// the caller's load-once cache; nothing here touches disk.
pub fn build_dashboard(
    config: &AppConfig,
    aggregated: &[Observation],
    shapes: &[CountryShape],
    available_years: &[i32],
    selected: &BTreeSet<i32>,
) -> Result<String> {
    let start = Instant::now();

    let filtered = processing::filter_years(aggregated, selected);
    let years = processing::distinct_years(&filtered);
    let records = geocode::geocode(filtered.clone());

    let sections: Vec<(MapFrames, IndicatorTable)> = Indicator::ALL
        .into_par_iter()
        .map(|indicator| {
            let frames = render::render_maps(&records, shapes, &years, indicator, &config.map)?;
            let table = table::build_table(&filtered, indicator);
            Ok((frames, table))
        })
        .collect::<Result<Vec<_>>>()?;

    let page = dashboard_page(config, available_years, selected, &sections);
    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        years = years.len(),
        "dashboard rebuilt"
    );
    Ok(page)
}

fn dashboard_page(
    config: &AppConfig,
    available_years: &[i32],
    selected: &BTreeSet<i32>,
    sections: &[(MapFrames, IndicatorTable)],
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(&config.dashboard.title));
    html.push_str("<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n<script>");
    html.push_str(SCRIPT);
    html.push_str("</script>\n</head>\n<body>\n");

    sidebar(&mut html, available_years, selected);

    html.push_str("<main>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(&config.dashboard.title));
    let _ = writeln!(html, "<p>{}</p>", escape(&config.dashboard.intro));

    if selected.is_empty() {
        html.push_str(
            "<p><em>No hay años seleccionados: marca al menos un año en la barra \
             lateral para ver los datos.</em></p>\n",
        );
    } else {
        for (frames, table) in sections {
            section(&mut html, frames, table);
        }
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn sidebar(html: &mut String, available_years: &[i32], selected: &BTreeSet<i32>) {
    html.push_str("<aside>\n<form method=\"get\" action=\"/\">\n");
    html.push_str("<h3>Selecciona los años</h3>\n<ul>\n");
    for &year in available_years {
        let checked = if selected.contains(&year) { " checked" } else { "" };
        let _ = writeln!(
            html,
            "<li><label><input type=\"checkbox\" name=\"year\" value=\"{year}\"{checked}> {year}</label></li>"
        );
    }
    // the named button makes a nothing-checked submit distinguishable from
    // a first visit with no query string at all
    html.push_str(
        "</ul>\n<button type=\"submit\" name=\"apply\" value=\"1\">Aplicar</button>\n</form>\n</aside>\n",
    );
}

fn section(html: &mut String, frames: &MapFrames, table: &IndicatorTable) {
    let indicator = frames.indicator;
    let slug = indicator.slug();
    let _ = writeln!(html, "<section id=\"{slug}\">\n<h2>{}</h2>", indicator.title());

    if frames.frames.len() > 1 {
        let _ = writeln!(
            html,
            "<div class=\"slider\"><input type=\"range\" min=\"0\" max=\"{}\" value=\"0\" step=\"1\" \
             oninput=\"showFrame('{slug}', this.value)\"> <strong id=\"{slug}-year\">{}</strong></div>",
            frames.frames.len() - 1,
            frames.frames[0].0
        );
    }
    for (i, (year, svg)) in frames.frames.iter().enumerate() {
        let active = if i == 0 { " active" } else { "" };
        let _ = writeln!(
            html,
            "<div class=\"frame frame-{slug}{active}\" data-year=\"{year}\">{svg}</div>"
        );
    }
    if !frames.frames.is_empty() {
        let _ = writeln!(
            html,
            "<div class=\"legend-bar\" style=\"background: {};\"></div>\
             <div class=\"legend\"><span>{}</span><span>{}</span></div>",
            render::SCALE_CSS,
            indicator.format(frames.min),
            indicator.format(frames.max)
        );
    }

    table_html(html, table);
    html.push_str("</section>\n");
}

fn table_html(html: &mut String, table: &IndicatorTable) {
    html.push_str("<table>\n<thead><tr><th>País</th>");
    for year in &table.years {
        let _ = write!(html, "<th>{year}</th>");
    }
    html.push_str("<th>Promedio</th></tr></thead>\n<tbody>\n");
    for row in &table.rows {
        let _ = write!(html, "<tr><td>{}</td>", escape(&row.country));
        for cell in &row.cells {
            match cell {
                Some(value) => {
                    let _ = write!(html, "<td>{}</td>", escape(value));
                }
                None => html.push_str("<td></td>"),
            }
        }
        let _ = writeln!(html, "<td>{}</td></tr>", escape(&row.average));
    }
    html.push_str("</tbody>\n</table>\n");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MapFrames;
    use crate::table::build_table;

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

    fn test_config() -> AppConfig {
        toml::from_str(
            r#"
            [input]
            data_csv = "Data.csv"
            boundaries = "latam.geojson"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn empty_selection_renders_the_notice_and_no_sections() {
        let config = test_config();
        let rows = vec![obs("Chile", 2020, 100.0)];
        let page =
            build_dashboard(&config, &rows, &[], &[2020], &BTreeSet::new()).unwrap();
        assert!(page.contains("No hay años seleccionados"));
        assert!(!page.contains("<section"));
    }

    #[test]
    fn full_page_carries_every_indicator_section() {
        let config = test_config();
        let rows = vec![obs("Chile", 2020, 100.0), obs("Peru", 2020, 50.0)];
        let selected: BTreeSet<i32> = [2020].into_iter().collect();
        let page = build_dashboard(&config, &rows, &[], &[2020], &selected).unwrap();
        for indicator in Indicator::ALL {
            assert!(page.contains(&format!("id=\"{}\"", indicator.slug())));
            assert!(page.contains(indicator.title()));
        }
        assert!(page.contains("Promedio"));
    }

    #[test]
    fn sidebar_checks_only_selected_years() {
        let config = test_config();
        let rows = vec![obs("Chile", 2019, 1.0), obs("Chile", 2020, 2.0)];
        let selected: BTreeSet<i32> = [2020].into_iter().collect();
        let page = build_dashboard(&config, &rows, &[], &[2019, 2020], &selected).unwrap();
        assert!(page.contains("value=\"2020\" checked"));
        assert!(page.contains("value=\"2019\">"));
    }

    #[test]
    fn country_names_are_html_escaped() {
        let config = test_config();
        let rows = vec![obs("A<B>&C", 2020, 1.0)];
        let selected: BTreeSet<i32> = [2020].into_iter().collect();
        let page = build_dashboard(&config, &rows, &[], &[2020], &selected).unwrap();
        assert!(page.contains("A&lt;B&gt;&amp;C"));
    }

    #[test]
    fn single_year_selection_gets_no_slider() {
        let frames = MapFrames {
            indicator: Indicator::Gdp,
            min: 0.0,
            max: 1.0,
            frames: vec![(2020, "<svg></svg>".to_string())],
        };
        let table = build_table(&[obs("Chile", 2020, 1.0)], Indicator::Gdp);
        let mut html = String::new();
        section(&mut html, &frames, &table);
        assert!(!html.contains("type=\"range\""));
        assert!(html.contains("data-year=\"2020\""));
    }
}
