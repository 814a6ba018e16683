//! A wrapper around the `prometheus` crate that provides a global, lazy
//! metrics registry with "friendlier" functions.
//!
//! The `Result` returned by `try_create_*` is stored in a `lazy_static` and
//! passed by reference to the update functions, which silently ignore
//! metrics that failed to register (e.g. because two crates picked the same
//! name). Reads and writes therefore never panic and never return errors at
//! the call site.
//!
//! ## Example
//!
//! ```rust
//! use lazy_static::lazy_static;
//! use beacon_metrics::*;
//!
//! lazy_static! {
//!     pub static ref RUN_COUNT: Result<IntCounter> =
//!         try_create_int_counter("runs_total", "Total number of runs");
//! }
//!
//! fn run() {
//!     inc_counter(&RUN_COUNT);
//! }
//! ```

pub use prometheus::{
    proto::{Metric, MetricFamily, MetricType},
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Result, TextEncoder,
};

/// Collect all the metrics for reporting.
pub fn gather() -> Vec<MetricFamily> {
    prometheus::gather()
}

/// Attempts to create an `IntCounter`, returning `Err` if the registry does
/// not accept the counter (potentially due to naming conflict).
pub fn try_create_int_counter(name: &str, help: &str) -> Result<IntCounter> {
    let opts = Opts::new(name, help);
    let counter = IntCounter::with_opts(opts)?;
    prometheus::register(Box::new(counter.clone()))?;
    Ok(counter)
}

/// Attempts to create an `IntGauge`, returning `Err` if the registry does
/// not accept the gauge (potentially due to naming conflict).
pub fn try_create_int_gauge(name: &str, help: &str) -> Result<IntGauge> {
    let opts = Opts::new(name, help);
    let gauge = IntGauge::with_opts(opts)?;
    prometheus::register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Attempts to create a `Gauge`, returning `Err` if the registry does not
/// accept the gauge (potentially due to naming conflict).
pub fn try_create_float_gauge(name: &str, help: &str) -> Result<Gauge> {
    let opts = Opts::new(name, help);
    let gauge = Gauge::with_opts(opts)?;
    prometheus::register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Attempts to create a `Histogram`, returning `Err` if the registry does
/// not accept the histogram (potentially due to naming conflict).
pub fn try_create_histogram(name: &str, help: &str) -> Result<Histogram> {
    let opts = HistogramOpts::new(name, help);
    let histogram = Histogram::with_opts(opts)?;
    prometheus::register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

pub fn set_gauge(gauge: &Result<IntGauge>, value: i64) {
    if let Ok(gauge) = gauge {
        gauge.set(value);
    }
}

pub fn set_float_gauge(gauge: &Result<Gauge>, value: f64) {
    if let Ok(gauge) = gauge {
        gauge.set(value);
    }
}

pub fn inc_counter(counter: &Result<IntCounter>) {
    if let Ok(counter) = counter {
        counter.inc();
    }
}

pub fn inc_counter_by(counter: &Result<IntCounter>, value: u64) {
    if let Ok(counter) = counter {
        counter.inc_by(value);
    }
}

pub fn observe(histogram: &Result<Histogram>, value: f64) {
    if let Ok(histogram) = histogram {
        histogram.observe(value);
    }
}

/// Reads the value of an int gauge, mostly useful in tests.
pub fn get_int_gauge_value(gauge: &Result<IntGauge>) -> Option<i64> {
    gauge.as_ref().ok().map(|gauge| gauge.get())
}

/// Reads the value of an int counter, mostly useful in tests.
pub fn get_int_counter_value(counter: &Result<IntCounter>) -> Option<u64> {
    counter.as_ref().ok().map(|counter| counter.get())
}

/// Sets a gauge from a `u64`, saturating at `i64::MAX` rather than wrapping.
pub fn set_gauge_by_u64(gauge: &Result<IntGauge>, value: u64) {
    set_gauge(gauge, value.min(i64::MAX as u64) as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_err_not_panic() {
        let first = try_create_int_gauge("beacon_metrics_test_gauge", "help");
        assert!(first.is_ok());
        let second = try_create_int_gauge("beacon_metrics_test_gauge", "help");
        assert!(second.is_err());

        // Updates through the failed handle are silently dropped.
        set_gauge(&second, 1);
        set_gauge(&first, 7);
        assert_eq!(get_int_gauge_value(&first), Some(7));
    }
}
