//! Analytics orchestration: concurrent source aggregation and the pure
//! chart-alignment transforms it feeds.

pub mod aggregator;
pub mod series;

pub use aggregator::{fetch_all, AnalyticsBundle, BriefingSession, BundleSlice, Generation};
pub use series::{to_scurve_series, to_trl_chart, ChartSeries, TrlChart};
