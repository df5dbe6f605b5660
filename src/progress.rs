//! Progress reporting for ingest runs.
//!
//! The ingest loop emits [`IngestEvent`]s to an [`Observer`]. Observers only
//! watch; nothing they do changes the rows a run returns.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::months::MonthKey;
use crate::table::ColumnDrift;

#[derive(Debug)]
pub enum IngestEvent<'a> {
    Configured {
        config: &'a RunConfig,
        extracted_at: DateTime<Utc>,
    },
    MonthsPlanned {
        months: &'a [MonthKey],
    },
    CategoryStarted {
        category: &'a str,
    },
    /// Rows in the file before date filtering.
    MonthDownloaded {
        category: &'a str,
        month: MonthKey,
        rows: usize,
    },
    /// Rows kept after date filtering.
    MonthFiltered {
        category: &'a str,
        month: MonthKey,
        rows: usize,
    },
    MonthFailed {
        category: &'a str,
        month: MonthKey,
        url: &'a str,
        error: &'a anyhow::Error,
    },
    CategoryCombined {
        category: &'a str,
        rows: usize,
    },
    CategoryEmpty {
        category: &'a str,
    },
    /// Combining or stamping a category failed; its rows are dropped.
    CategoryFailed {
        category: &'a str,
        error: &'a anyhow::Error,
    },
    /// A column could not be converted to the merged type and was filled
    /// with nulls. `category` is `None` when merging across categories.
    ColumnNulled {
        category: Option<&'a str>,
        drift: &'a ColumnDrift,
    },
    Finished {
        rows: usize,
    },
}

pub trait Observer {
    fn on_event(&self, event: &IngestEvent<'_>);
}

impl<F> Observer for F
where
    F: Fn(&IngestEvent<'_>),
{
    fn on_event(&self, event: &IngestEvent<'_>) {
        self(event)
    }
}

/// Writes every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &IngestEvent<'_>) {
        match event {
            IngestEvent::Configured {
                config,
                extracted_at,
            } => info!(
                date_range = %config.range,
                taxi_types = ?config.categories,
                extracted_at = %extracted_at,
                "Configuration loaded"
            ),
            IngestEvent::MonthsPlanned { months } => {
                let listed: Vec<String> = months.iter().map(MonthKey::to_string).collect();
                info!(count = months.len(), months = ?listed, "Year-month list generated");
            }
            IngestEvent::CategoryStarted { category } => {
                info!(taxi_type = %category, "Processing taxi type")
            }
            IngestEvent::MonthDownloaded {
                category,
                month,
                rows,
            } => info!(taxi_type = %category, month = %month, rows, "Downloaded month"),
            IngestEvent::MonthFiltered {
                category,
                month,
                rows,
            } => info!(taxi_type = %category, month = %month, rows, "After date filtering"),
            IngestEvent::MonthFailed {
                category,
                month,
                url,
                error,
            } => warn!(
                taxi_type = %category,
                month = %month,
                url = %url,
                error = %error,
                "Month skipped"
            ),
            IngestEvent::CategoryCombined { category, rows } => {
                info!(taxi_type = %category, rows, "Combined taxi type")
            }
            IngestEvent::CategoryEmpty { category } => {
                info!(taxi_type = %category, "No data found for taxi type")
            }
            IngestEvent::CategoryFailed { category, error } => {
                warn!(taxi_type = %category, error = %error, "Taxi type skipped")
            }
            IngestEvent::ColumnNulled { category, drift } => warn!(
                taxi_type = category.unwrap_or("*"),
                column = %drift.column,
                from = %drift.from,
                to = %drift.to,
                "Column type mismatch, values replaced with nulls"
            ),
            IngestEvent::Finished { rows } => {
                if *rows == 0 {
                    info!("No data found");
                } else {
                    info!(rows, "Total rows ingested");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn observer_fn<F: Fn(&IngestEvent<'_>)>(f: F) -> F {
        f
    }

    #[test]
    fn test_closure_observer_receives_events() {
        let seen = Mutex::new(Vec::new());
        let observer = observer_fn(|event| {
            if let IngestEvent::Finished { rows } = event {
                seen.lock().unwrap().push(*rows);
            }
        });

        observer.on_event(&IngestEvent::CategoryStarted { category: "yellow" });
        observer.on_event(&IngestEvent::Finished { rows: 42 });

        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn test_tracing_observer_handles_every_event() {
        let config = RunConfig::new(
            crate::months::DateRange::parse("2025-01-01", "2025-01-31").unwrap(),
            vec!["yellow".to_string()],
        );
        let months = config.range.months();
        let error = anyhow::anyhow!("boom");
        let drift = ColumnDrift {
            column: "ehail_fee".to_string(),
            from: arrow::datatypes::DataType::Utf8,
            to: arrow::datatypes::DataType::Float64,
        };
        let month = months[0];

        let events = [
            IngestEvent::Configured {
                config: &config,
                extracted_at: Utc::now(),
            },
            IngestEvent::MonthsPlanned { months: &months },
            IngestEvent::CategoryStarted { category: "yellow" },
            IngestEvent::MonthDownloaded {
                category: "yellow",
                month,
                rows: 10,
            },
            IngestEvent::MonthFiltered {
                category: "yellow",
                month,
                rows: 8,
            },
            IngestEvent::MonthFailed {
                category: "yellow",
                month,
                url: "http://example.invalid",
                error: &error,
            },
            IngestEvent::CategoryCombined {
                category: "yellow",
                rows: 8,
            },
            IngestEvent::CategoryEmpty { category: "green" },
            IngestEvent::CategoryFailed {
                category: "green",
                error: &error,
            },
            IngestEvent::ColumnNulled {
                category: None,
                drift: &drift,
            },
            IngestEvent::Finished { rows: 0 },
            IngestEvent::Finished { rows: 8 },
        ];

        for event in &events {
            TracingObserver.on_event(event);
        }
    }
}
