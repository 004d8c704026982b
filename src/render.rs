use crate::config::MapConfig;
use crate::types::{CountryShape, GeoCoded, Indicator};
use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Rendered frames for one indicator: one SVG per selected year plus the
/// value range behind the shared color scale.
pub struct MapFrames {
    pub indicator: Indicator,
    pub min: f64,
    pub max: f64,
    pub frames: Vec<(i32, String)>,
}

/// CSS gradient matching [`ColorScale`], for the page legend.
pub const SCALE_CSS: &str = "linear-gradient(to right, rgb(222,235,247), rgb(8,48,107))";

/// Linear scale from light to deep blue. The bounds span the observed
/// min/max across ALL selected years, not per frame, so a country's shade
/// stays comparable while scrubbing the time slider.
pub struct ColorScale {
    min: f64,
    max: f64,
}

const SCALE_LIGHT: (f64, f64, f64) = (222.0, 235.0, 247.0);
const SCALE_DEEP: (f64, f64, f64) = (8.0, 48.0, 107.0);

impl ColorScale {
    pub fn from_records(records: &[GeoCoded], indicator: Indicator) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for record in records {
            let v = indicator.value(&record.obs);
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() || !max.is_finite() {
            return Self { min: 0.0, max: 0.0 };
        }
        Self { min, max }
    }

    pub fn color(&self, value: f64) -> RGBColor {
        let t = if self.max > self.min {
            ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let channel = |lo: f64, hi: f64| (lo + (hi - lo) * t).round() as u8;
        RGBColor(
            channel(SCALE_LIGHT.0, SCALE_DEEP.0),
            channel(SCALE_LIGHT.1, SCALE_DEEP.1),
            channel(SCALE_LIGHT.2, SCALE_DEEP.2),
        )
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Values shaded in one frame: alpha-3 code → indicator value for the given
/// year. Rows without a code never make it in, which is exactly how
/// unresolved countries stay off the map.
pub fn frame_values<'a>(
    records: &'a [GeoCoded],
    indicator: Indicator,
    year: i32,
) -> HashMap<&'a str, f64> {
    records
        .iter()
        .filter(|r| r.obs.year == year)
        .filter_map(|r| r.code.map(|code| (code, indicator.value(&r.obs))))
        .collect()
}

/// Renders the per-year choropleth frames for one indicator.
pub fn render_maps(
    records: &[GeoCoded],
    shapes: &[CountryShape],
    years: &[i32],
    indicator: Indicator,
    map: &MapConfig,
) -> Result<MapFrames> {
    let scale = ColorScale::from_records(records, indicator);
    let mut frames = Vec::with_capacity(years.len());
    for &year in years {
        let values = frame_values(records, indicator, year);
        let svg = draw_frame(shapes, &values, &scale, map)?;
        frames.push((year, svg));
    }
    debug!(
        indicator = indicator.slug(),
        frames = frames.len(),
        "rendered choropleth frames"
    );
    let (min, max) = scale.bounds();
    Ok(MapFrames {
        indicator,
        min,
        max,
        frames,
    })
}

fn draw_frame(
    shapes: &[CountryShape],
    values: &HashMap<&str, f64>,
    scale: &ColorScale,
    map: &MapConfig,
) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (map.width, map.height)).into_drawing_area();
        root.fill(&RGBColor(235, 244, 250))
            .map_err(|e| anyhow!("failed to fill map background: {e}"))?;

        let mut chart = ChartBuilder::on(&root)
            .build_cartesian_2d(map.lon_min..map.lon_max, map.lat_min..map.lat_max)
            .map_err(|e| anyhow!("failed to build map viewport: {e}"))?;

        for shape in shapes {
            let fill = values.get(shape.code.as_str()).map(|&v| scale.color(v));
            for ring in &shape.rings {
                if let Some(color) = fill {
                    chart
                        .draw_series(std::iter::once(Polygon::new(ring.clone(), color.filled())))
                        .map_err(|e| anyhow!("failed to draw {}: {e}", shape.code))?;
                }
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        ring.clone(),
                        &BLACK.mix(0.35),
                    )))
                    .map_err(|e| anyhow!("failed to outline {}: {e}", shape.code))?;
            }
        }

        root.present()
            .map_err(|e| anyhow!("failed to finalize map SVG: {e}"))?;
    }
    Ok(svg)
}
