//! Pure chart-alignment transforms.
//!
//! Raw time-indexed records come back from the backend in two shapes:
//! cumulative S-curve points and a split history/forecast TRL series.
//! These functions turn both into label-axis + value-array pairs that a
//! renderer can plot directly. No I/O, no state, no rendering knowledge.

use crate::models::{SCurvePoint, TrlSeries};

/// A single-line chart: one label axis, one value per label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

/// A two-line chart sharing one label axis.
///
/// `history_values` and `forecast_values` always have the same length as
/// `labels`; positions outside each segment are `None`. Plotting the two
/// rows as separate datasets yields a solid line that stops where a dashed
/// forecast line begins, without this module knowing about either style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrlChart {
    pub labels: Vec<String>,
    pub history_values: Vec<Option<f64>>,
    pub forecast_values: Vec<Option<f64>>,
}

/// Align cumulative-adoption points into a chart series.
///
/// Length-preserving: labels and values correspond 1:1 with the input in
/// arrival order. Non-decreasing counts are expected but not enforced.
pub fn to_scurve_series(points: &[SCurvePoint]) -> ChartSeries {
    ChartSeries {
        labels: points.iter().map(|p| p.year.to_string()).collect(),
        values: points.iter().map(|p| p.cumulative_count).collect(),
    }
}

/// Align a history/forecast TRL series onto a single label axis.
///
/// Labels are history years then forecast years, with no de-duplication at
/// the boundary even when the forecast repeats the transition year.
pub fn to_trl_chart(series: &TrlSeries) -> TrlChart {
    let history_len = series.history.len();
    let forecast_len = series.forecast.len();

    let mut labels = Vec::with_capacity(history_len + forecast_len);
    labels.extend(series.history.iter().map(|p| p.year.to_string()));
    labels.extend(series.forecast.iter().map(|p| p.year.to_string()));

    let mut history_values: Vec<Option<f64>> = Vec::with_capacity(history_len + forecast_len);
    history_values.extend(series.history.iter().map(|p| Some(p.avg_trl)));
    history_values.extend(std::iter::repeat(None).take(forecast_len));

    let mut forecast_values: Vec<Option<f64>> = Vec::with_capacity(history_len + forecast_len);
    forecast_values.extend(std::iter::repeat(None).take(history_len));
    forecast_values.extend(series.forecast.iter().map(|p| Some(p.avg_trl)));

    TrlChart {
        labels,
        history_values,
        forecast_values,
    }
}
