//! Query objects read numbers back from the GPU, like the number of samples
//! passing the depth test or the time spent between two commands.
//!
//! Only one query of each kind can be active at a time. Results arrive
//! asynchronously; receiving them without waiting returns nothing until the
//! GPU has caught up.

impl_handle!(QueryHandle);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum QueryKind {
    SamplesPassed,
    AnySamplesPassed,
    AnySamplesPassedConservative,
    PrimitivesGenerated,
    TransformFeedbackPrimitivesWritten,
    /// Results are reported in milliseconds.
    TimeElapsed,
}

impl QueryKind {
    pub const VARIANTS: [QueryKind; 6] = [
        QueryKind::SamplesPassed,
        QueryKind::AnySamplesPassed,
        QueryKind::AnySamplesPassedConservative,
        QueryKind::PrimitivesGenerated,
        QueryKind::TransformFeedbackPrimitivesWritten,
        QueryKind::TimeElapsed,
    ];

    /// Converts a raw driver result. Timers count nanoseconds.
    pub fn convert(self, raw: u64) -> f64 {
        match self {
            QueryKind::TimeElapsed => raw as f64 / 1_000_000.0,
            _ => raw as f64,
        }
    }
}

/// Weight of the latest result in the smoothed average.
const SMOOTHING: f64 = 0.02;

/// Statistics over all results received by a query object.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct QueryResults {
    pub latest: f64,
    /// An exponentially smoothed average, not the true mean.
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: u32,
}

impl QueryResults {
    pub fn record(&mut self, value: f64) {
        self.latest = value;

        if self.count == 0 {
            self.average = value;
            self.min = value;
            self.max = value;
        } else {
            self.average += (value - self.average) * SMOOTHING;
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        self.count += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record() {
        let mut results = QueryResults::default();
        results.record(10.0);
        assert_eq!((results.average, results.min, results.max), (10.0, 10.0, 10.0));

        results.record(60.0);
        assert_eq!(results.latest, 60.0);
        assert!((results.average - 11.0).abs() < 1e-9);
        assert_eq!((results.min, results.max), (10.0, 60.0));

        results.record(5.0);
        assert_eq!(results.min, 5.0);
        assert_eq!(results.count, 3);
    }

    #[test]
    fn convert() {
        assert_eq!(QueryKind::TimeElapsed.convert(2_500_000), 2.5);
        assert_eq!(QueryKind::SamplesPassed.convert(42), 42.0);
    }
}
