// Bursary Dashboard - Core Library
// Shared by the CLI renderer, the terminal dashboard, the web server and tests

pub mod error;
pub mod config;
pub mod normalize;
pub mod records;
pub mod aggregate;
pub mod collapse;
pub mod format;
pub mod dashboard;
pub mod html;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{AggregateError, DataLoadError};
pub use config::{DashboardConfig, CONFIG_FILE};
pub use normalize::{canonical_ethnic_group, strip_year_suffix};
pub use records::{
    BursaryRecord, Dataset, QualificationKeyEntry, QualificationKeyTable,
    load_records, load_qualification_key, parse_funds,
};
pub use aggregate::{
    AggregatedSeries, DenseSeries, Dimension, GroupKey,
    dense_reindex, distinct_values, sum_by,
};
pub use collapse::{CollapsedDistribution, DisclosureNote, MinorSliceCollapser, OTHER_LABEL};
pub use format::{format_rand, format_share, format_share_precise};
pub use dashboard::{
    BarDatum, Dashboard, DonutChart, DonutSlice, GroupedBars, ProportionSlice,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
