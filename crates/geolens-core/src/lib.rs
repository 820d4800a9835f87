//! # geolens-core
//!
//! Core library for judging how well a web page can be found, read and cited
//! by generative AI engines (GEO) and classic search engines (SEO).
//!
//! This library provides:
//! - Structural content extraction with Readability-style boilerplate removal
//! - Multilingual detectors for definitions, quotable sentences and entities
//! - AI crawler access evaluation from robots.txt, meta robots and X-Robots-Tag
//! - A weighted 0-100 GEO score with blockers, fixes and extended metrics
//! - Rule-based SEO checks and multi-page comparison
//!
//! ## Features
//!
//! - `readability` (default): main content extraction through `dom_smoothie`
//! - `http` (default): [`HttpFetcher`] for pages and accessibility probes
//!
//! ## Example
//!
//! ```no_run
//! use geolens_core::{Capabilities, Settings, access::AiAccessResult, geo, parser};
//!
//! # fn example() -> anyhow::Result<()> {
//! let html = r#"<html><head><title>GEO basics</title></head>
//!     <body><h1>GEO basics</h1><p>GEO refers to optimizing pages for AI answers.</p></body></html>"#;
//!
//! let settings = Settings::default();
//! let parsed = parser::parse_content(html, "https://example.com/geo", &Capabilities::none(), &settings)?;
//! let result = geo::check_geo_with_access(&parsed, AiAccessResult::default(), false);
//! println!("{} ({})", result.geo_score.total, result.geo_score.grade);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod analyzer;
pub mod capabilities;
pub mod compare;
pub mod config;
pub mod detectors;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod language;
pub mod parser;
pub mod readability;
pub mod seo;
pub mod structured_data;
pub mod types;
pub mod url_utils;

// Re-export commonly used types
pub use analyzer::{AnalysisReport, Analyzer};
pub use capabilities::{Capabilities, EntityRecognizer, RecognizedEntity};
pub use config::Settings;
pub use error::{AnalyzeError, CompareError, FetchError, ParseError};
pub use types::ParsedContent;

pub use compare::{compare_reports, compare_results, comparison_insights, create_comparison_payload};
pub use fetch::{PageFetcher, StaticFetcher};
pub use geo::{GeoResult, GeoScore, Grade, check_geo};
pub use parser::parse_content;
pub use seo::{SeoIssue, Severity, check_seo};

#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
