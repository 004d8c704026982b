//! Economic dashboard for Latin American countries: loads a semicolon-
//! delimited indicator dataset, aggregates by (country, year), resolves
//! country names to ISO alpha-3 codes, and renders choropleth maps plus
//! ranked pivot tables per indicator, filterable by year.

pub mod config;
pub mod data;
pub mod geocode;
pub mod page;
pub mod processing;
pub mod render;
pub mod server;
pub mod table;
pub mod types;
