//! The range fetcher: month enumeration, per-month download and filtering,
//! and the combine step that produces one stamped table per run.

use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};

use crate::config::{FetchSettings, RunConfig};
use crate::fetch::{BasicClient, HttpSource, Source, trip_data_url};
use crate::filter::filter_to_date_range;
use crate::months::{DateRange, MonthKey};
use crate::parser::{Decoder, ParquetDecoder};
use crate::progress::{IngestEvent, Observer, TracingObserver};
use crate::schema::trip_schema;
use crate::table::{ColumnDrift, RowTable};

pub struct RangeFetcher<S, D, O> {
    source: S,
    decoder: D,
    observer: O,
    base_url: String,
}

impl RangeFetcher<HttpSource<BasicClient>, ParquetDecoder, TracingObserver> {
    /// The production wiring: HTTP downloads, parquet decoding, `tracing`
    /// progress output.
    pub fn http(settings: &FetchSettings) -> Result<Self> {
        let client = BasicClient::with_timeout(settings.timeout)?;
        Ok(Self::new(
            HttpSource::new(client),
            ParquetDecoder::new(),
            TracingObserver,
            &settings.base_url,
        ))
    }
}

impl<S, D, O> RangeFetcher<S, D, O>
where
    S: Source,
    D: Decoder,
    O: Observer,
{
    pub fn new(source: S, decoder: D, observer: O, base_url: &str) -> Self {
        Self {
            source,
            decoder,
            observer,
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Downloads and decodes one monthly file.
    ///
    /// Any download or decode failure is reported and yields `None`; it never
    /// aborts the caller.
    #[tracing::instrument(skip(self, month), fields(month = %month))]
    pub async fn fetch_month(&self, category: &str, month: MonthKey) -> Option<RowTable> {
        let url = trip_data_url(&self.base_url, category, month);

        match self.download(&url).await {
            Ok(table) => {
                self.observer.on_event(&IngestEvent::MonthDownloaded {
                    category,
                    month,
                    rows: table.num_rows(),
                });
                Some(table)
            }
            Err(error) => {
                self.observer.on_event(&IngestEvent::MonthFailed {
                    category,
                    month,
                    url: &url,
                    error: &error,
                });
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Result<RowTable> {
        let bytes = self.source.fetch(url).await?;
        self.decoder.decode(bytes)
    }

    /// One month restricted to the window, or `None` if it failed or kept no
    /// rows. A failed filter is reported like a failed download.
    async fn month_rows(
        &self,
        category: &str,
        month: MonthKey,
        range: &DateRange,
    ) -> Option<RowTable> {
        let raw = self.fetch_month(category, month).await?;

        match filter_to_date_range(raw, range) {
            Ok(filtered) => {
                self.observer.on_event(&IngestEvent::MonthFiltered {
                    category,
                    month,
                    rows: filtered.num_rows(),
                });
                (!filtered.is_empty()).then_some(filtered)
            }
            Err(error) => {
                let url = trip_data_url(&self.base_url, category, month);
                self.observer.on_event(&IngestEvent::MonthFailed {
                    category,
                    month,
                    url: &url,
                    error: &error,
                });
                None
            }
        }
    }

    /// Concatenates one category's months and stamps the result.
    fn combine_category(
        &self,
        category: &str,
        monthly: Vec<RowTable>,
        extracted_at: DateTime<Utc>,
    ) -> Result<Option<RowTable>> {
        let Some(merged) = RowTable::merge(monthly)? else {
            return Ok(None);
        };
        self.report_drift(Some(category), &merged.drift);
        merged.table.with_extraction_timestamp(extracted_at).map(Some)
    }

    fn report_drift(&self, category: Option<&str>, drift: &[ColumnDrift]) {
        for entry in drift {
            self.observer
                .on_event(&IngestEvent::ColumnNulled { category, drift: entry });
        }
    }

    /// Runs the whole window with an extraction timestamp taken now.
    pub async fn run(&self, config: &RunConfig) -> Result<RowTable> {
        self.run_at(config, Utc::now()).await
    }

    /// Runs the whole window, stamping every row with `extracted_at`.
    ///
    /// Rows are ordered by category in the given order, then by month. When
    /// nothing was produced the result is an empty table with the fixed trip
    /// columns.
    ///
    /// # Errors
    ///
    /// Only structural failures while combining categories are returned.
    /// Months that cannot be fetched or decoded are skipped, and columns whose
    /// types cannot be reconciled are filled with nulls and reported.
    #[tracing::instrument(skip_all, fields(date_range = %config.range))]
    pub async fn run_at(&self, config: &RunConfig, extracted_at: DateTime<Utc>) -> Result<RowTable> {
        // The output column holds microseconds.
        let extracted_at = extracted_at.trunc_subsecs(6);
        self.observer.on_event(&IngestEvent::Configured {
            config,
            extracted_at,
        });

        let months = config.range.months();
        self.observer
            .on_event(&IngestEvent::MonthsPlanned { months: &months });

        let mut combined = Vec::new();

        for category in &config.categories {
            self.observer
                .on_event(&IngestEvent::CategoryStarted { category });

            let mut monthly = Vec::new();
            for &month in &months {
                if let Some(table) = self.month_rows(category, month, &config.range).await {
                    monthly.push(table);
                }
            }

            match self.combine_category(category, monthly, extracted_at) {
                Ok(Some(table)) => {
                    self.observer.on_event(&IngestEvent::CategoryCombined {
                        category,
                        rows: table.num_rows(),
                    });
                    combined.push(table);
                }
                Ok(None) => self
                    .observer
                    .on_event(&IngestEvent::CategoryEmpty { category }),
                Err(error) => self.observer.on_event(&IngestEvent::CategoryFailed {
                    category,
                    error: &error,
                }),
            }
        }

        let result = match RowTable::merge(combined)? {
            Some(merged) if !merged.table.is_empty() => {
                self.report_drift(None, &merged.drift);
                merged.table
            }
            _ => RowTable::empty(trip_schema()),
        };

        self.observer.on_event(&IngestEvent::Finished {
            rows: result.num_rows(),
        });
        Ok(result)
    }
}
