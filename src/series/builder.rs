//! Gap-aware, edge-padded series construction for stacked charts.
//!
//! Every series in a stacked group must share identical x-axis points, so
//! the group owns all of them and applies the three shaping operations in
//! lock-step: an initial upslope when data starts after the range does, gap
//! padding when buckets are missing, and a final downslope when data stops
//! before the range ends.

use super::DataSeries;

/// Builder for a stacked group of chart series.
///
/// Feed it one `push` per time bucket, ascending; `finish` applies the
/// final downslope and releases the series.
#[derive(Debug)]
pub struct SeriesGroup {
    from: i64,
    to: i64,
    interval: i64,
    downslope_slack: f64,
    series: Vec<DataSeries>,
    last_capture_time: Option<i64>,
}

impl SeriesGroup {
    /// Creates a group over the requested range.
    ///
    /// `names` become the series, in order; `None` is the synthetic "Other"
    /// series. `interval` is the nominal spacing between data points,
    /// milliseconds.
    pub fn new(
        from: i64,
        to: i64,
        interval: i64,
        downslope_slack: f64,
        names: Vec<Option<String>>,
    ) -> Self {
        let series = names
            .into_iter()
            .map(|name| match name {
                Some(name) => DataSeries::new(name),
                None => DataSeries::other(),
            })
            .collect();
        SeriesGroup {
            from,
            to,
            interval,
            downslope_slack,
            series,
            last_capture_time: None,
        }
    }

    /// Number of series in the group
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if the group holds no series
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Appends one value per series at the given capture time.
    ///
    /// `values` must be in series order and match the group size. Capture
    /// times must be fed ascending.
    pub fn push(&mut self, capture_time: i64, values: &[f64]) {
        debug_assert_eq!(values.len(), self.series.len());
        match self.last_capture_time {
            None => self.add_initial_upslope(capture_time),
            Some(last) => self.add_gap_if_needed(last, capture_time),
        }
        for (series, &value) in self.series.iter_mut().zip(values) {
            series.push_value(capture_time, value);
        }
        self.last_capture_time = Some(capture_time);
    }

    /// Applies the final downslope and returns the finished series.
    ///
    /// `now` is wall-clock ms, used to tell "data stopped" apart from "the
    /// current interval is still accumulating".
    pub fn finish(mut self, now: i64) -> Vec<DataSeries> {
        self.add_final_downslope(now);
        self.series
    }

    /// Prevents the chart starting at a nonzero plateau when the first
    /// sample lands after the (grid-aligned) range start.
    fn add_initial_upslope(&mut self, first_capture_time: i64) {
        let grid_start = ceil_to_grid(self.from, self.interval);
        if first_capture_time == grid_start {
            return;
        }
        let zero_at = first_capture_time - self.interval;
        for series in &mut self.series {
            series.push_value(zero_at, 0.0);
        }
    }

    /// Pads missing buckets between two consecutive samples.
    ///
    /// A gap of up to two intervals gets a single zero point; a wider gap
    /// gets a ramp-down zero, an explicit break, and a ramp-up zero. The
    /// two-interval cutoff also keeps x points monotonic for capture times
    /// that are not grid-aligned, where the ramp-up would otherwise land
    /// before the ramp-down.
    fn add_gap_if_needed(&mut self, last_capture_time: i64, capture_time: i64) {
        let gap = capture_time - last_capture_time;
        if gap <= self.interval {
            return;
        }
        let ramp_down = last_capture_time + self.interval;
        if gap <= 2 * self.interval {
            for series in &mut self.series {
                series.push_value(ramp_down, 0.0);
            }
            return;
        }
        let ramp_up = capture_time - self.interval;
        for series in &mut self.series {
            series.push_value(ramp_down, 0.0);
            series.push_break(ramp_down);
            series.push_value(ramp_up, 0.0);
        }
    }

    /// Ramps the chart down to zero when data stopped before the range's
    /// right edge. Skipped while the last interval may still be
    /// accumulating, which would otherwise render a false drop.
    fn add_final_downslope(&mut self, now: i64) {
        let Some(last) = self.last_capture_time else {
            return;
        };
        if last >= self.to {
            return;
        }
        let slack = self.downslope_slack * self.interval as f64;
        if (now - last) as f64 <= slack {
            return;
        }
        let zero_at = last + self.interval;
        for series in &mut self.series {
            series.push_value(zero_at, 0.0);
        }
    }
}

fn ceil_to_grid(time: i64, interval: i64) -> i64 {
    time.div_euclid(interval) * interval
        + if time.rem_euclid(interval) == 0 { 0 } else { interval }
}
