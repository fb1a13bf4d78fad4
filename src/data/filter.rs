use super::model::SamplePairs;

// ---------------------------------------------------------------------------
// Time window predicate
// ---------------------------------------------------------------------------

/// Closed crop interval `[lower, upper]` in seconds.
///
/// `lower > upper` is allowed and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub lower: f64,
    pub upper: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl TimeWindow {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Whether `t` lies inside the window, both ends inclusive.
    pub fn contains(&self, t: f64) -> bool {
        self.lower <= t && t <= self.upper
    }

    /// Boolean mask over `times`.
    pub fn mask(&self, times: &[f64]) -> Vec<bool> {
        times.iter().map(|&t| self.contains(t)).collect()
    }

    /// Keep the pairs whose time is inside the window, in their original order.
    ///
    /// The mask over `times` is applied to both arrays.
    pub fn filter(&self, pairs: &SamplePairs) -> SamplePairs {
        let (times, values) = self
            .mask(&pairs.times)
            .into_iter()
            .zip(pairs.times.iter().zip(pairs.values.iter()))
            .filter_map(|(keep, (&t, &v))| keep.then_some((t, v)))
            .unzip();
        SamplePairs { times, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> SamplePairs {
        SamplePairs::new(
            vec![0.0, 0.2, 0.5, 0.8, 1.0, 1.5],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
    }

    #[test]
    fn test_filter_inclusive_bounds() {
        let out = TimeWindow::new(0.2, 1.0).filter(&scenario());
        assert_eq!(out.times, vec![0.2, 0.5, 0.8, 1.0]);
        assert_eq!(out.values, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_default_window() {
        let out = TimeWindow::default().filter(&scenario());
        assert_eq!(out.times, vec![0.0, 0.2, 0.5, 0.8, 1.0]);
        assert_eq!(out.len(), out.values.len());
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let out = TimeWindow::new(1.0, 0.2).filter(&scenario());
        assert!(out.is_empty());
        assert!(out.values.is_empty());
    }

    #[test]
    fn test_degenerate_window_keeps_exact_match() {
        let out = TimeWindow::new(0.5, 0.5).filter(&scenario());
        assert_eq!(out.times, vec![0.5]);
        assert_eq!(out.values, vec![3.0]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let window = TimeWindow::new(0.1, 0.9);
        let once = window.filter(&scenario());
        let twice = window.filter(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_mask_matches_filter_count() {
        let window = TimeWindow::new(0.2, 1.0);
        let data = scenario();
        let mask = window.mask(&data.times);
        assert_eq!(mask, vec![false, true, true, true, true, false]);
        assert_eq!(
            mask.iter().filter(|&&m| m).count(),
            window.filter(&data).len()
        );
    }

    #[test]
    fn test_mask_selects_values_by_time() {
        // Values out of time order must follow their timestamps.
        let data = SamplePairs::new(vec![2.0, 0.5, 1.0, -0.1], vec![9.0, 7.0, 8.0, 6.0]);
        let window = TimeWindow::new(0.5, 1.0);
        assert_eq!(window.mask(&data.times), vec![false, true, true, false]);
        let out = window.filter(&data);
        assert_eq!(out.times, vec![0.5, 1.0]);
        assert_eq!(out.values, vec![7.0, 8.0]);
    }

    #[test]
    fn test_nan_times_never_match() {
        let data = SamplePairs::new(vec![f64::NAN, 0.5], vec![1.0, 2.0]);
        let out = TimeWindow::default().filter(&data);
        assert_eq!(out.values, vec![2.0]);
    }
}
