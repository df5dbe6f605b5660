//! Run configuration and its environment-variable source.
//!
//! The ingest core only sees [`RunConfig`] and [`FetchSettings`]; reading the
//! process environment happens here and is called from the CLI.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::fetch::{DEFAULT_BASE_URL, REQUEST_TIMEOUT};
use crate::months::DateRange;

pub const START_DATE_VAR: &str = "BRUIN_START_DATE";
pub const END_DATE_VAR: &str = "BRUIN_END_DATE";
pub const VARS_VAR: &str = "BRUIN_VARS";
pub const BASE_URL_VAR: &str = "TRIP_DATA_BASE_URL";

pub const DEFAULT_START_DATE: &str = "2025-01-01";
pub const DEFAULT_END_DATE: &str = "2025-01-31";
pub const DEFAULT_TAXI_TYPE: &str = "yellow";

/// What to ingest: a date window and the categories to fetch for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub range: DateRange,
    pub categories: Vec<String>,
}

impl RunConfig {
    pub fn new(range: DateRange, categories: Vec<String>) -> Self {
        Self { range, categories }
    }

    /// Reads `BRUIN_START_DATE`, `BRUIN_END_DATE` and `BRUIN_VARS`, applying
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            std::env::var(START_DATE_VAR).ok().as_deref(),
            std::env::var(END_DATE_VAR).ok().as_deref(),
            std::env::var(VARS_VAR).ok().as_deref(),
        )
    }

    /// Builds a config from optional raw values as found in the environment.
    ///
    /// # Errors
    ///
    /// Fails on unparseable dates, a start after the end, or a variable bag
    /// that is not a JSON object with an optional `taxi_types` string list.
    pub fn from_values(start: Option<&str>, end: Option<&str>, vars: Option<&str>) -> Result<Self> {
        let range = DateRange::parse(
            start.unwrap_or(DEFAULT_START_DATE),
            end.unwrap_or(DEFAULT_END_DATE),
        )?;
        let vars = match vars {
            Some(raw) => PipelineVars::parse(raw)?,
            None => PipelineVars::default(),
        };
        Ok(Self::new(range, vars.taxi_types))
    }
}

/// The JSON variable bag handed over by the orchestrator.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct PipelineVars {
    #[serde(default = "default_taxi_types")]
    pub taxi_types: Vec<String>,
}

impl Default for PipelineVars {
    fn default() -> Self {
        Self {
            taxi_types: default_taxi_types(),
        }
    }
}

impl PipelineVars {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).with_context(|| format!("invalid {VARS_VAR} JSON: {raw}"))
    }
}

fn default_taxi_types() -> Vec<String> {
    vec![DEFAULT_TAXI_TYPE.to_string()]
}

/// Where and how monthly files are downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl FetchSettings {
    /// Defaults, with the base URL overridable through `TRIP_DATA_BASE_URL`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(base_url) = std::env::var(BASE_URL_VAR) {
            if !base_url.trim().is_empty() {
                settings.base_url = base_url.trim().to_string();
            }
        }
        settings
    }
}
