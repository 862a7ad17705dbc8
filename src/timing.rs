use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Samples {
    count: u32,
    sum: Duration,
    max: Duration,
}

impl Samples {
    fn add(&mut self, took: Duration) {
        self.count += 1;
        self.sum += took;
        self.max = self.max.max(took);
    }

    fn avg(&self) -> Duration {
        self.sum / self.count.max(1)
    }
}

/// Times one page build, broken down by query category.
///
/// A page slower than its trip-wire is reported with the breakdown.
#[derive(Debug)]
pub struct PageTimer {
    label: &'static str,
    started: Instant,
    page_trip: Duration,
    query_trip: Duration,
    samples: BTreeMap<&'static str, Samples>,
}

impl PageTimer {
    pub fn start(label: &'static str, page_trip: Duration, query_trip: Duration) -> Self {
        Self {
            label,
            started: Instant::now(),
            page_trip,
            query_trip,
            samples: BTreeMap::new(),
        }
    }

    pub fn time<T>(&mut self, category: &'static str, f: impl FnOnce() -> T) -> T {
        let tic = Instant::now();
        let res = f();
        let took = tic.elapsed();
        if took > self.query_trip {
            log::debug!("{} {category} query took {took:?}", self.label);
        }
        self.samples.entry(category).or_default().add(took);
        res
    }

    pub fn count(&self, category: &str) -> u32 {
        self.samples.get(category).map_or(0, |s| s.count)
    }

    /// Ends the page. Returns whether it tripped.
    pub fn finish(self, first_item: usize) -> bool {
        let took = self.started.elapsed();
        if took <= self.page_trip {
            return false;
        }
        log::warn!("{} page at item {first_item} took {took:?}", self.label);
        for (category, s) in &self.samples {
            log::warn!(
                "  {category:<8} avg {:?} max {:?} sum {:?} count {}",
                s.avg(),
                s.max,
                s.sum,
                s.count
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_category() {
        let mut timer = PageTimer::start("test", Duration::from_secs(60), Duration::from_secs(60));
        assert_eq!(timer.time("bytes", || 3), 3);
        timer.time("bytes", || ());
        timer.time("count", || ());
        assert_eq!(timer.count("bytes"), 2);
        assert_eq!(timer.count("count"), 1);
        assert_eq!(timer.count("seek"), 0);
        assert!(!timer.finish(0));
    }

    #[test]
    fn zero_trip_always_trips() {
        let mut timer = PageTimer::start("test", Duration::ZERO, Duration::ZERO);
        timer.time("page", || std::thread::sleep(Duration::from_millis(1)));
        assert!(timer.finish(7));
    }

    #[test]
    fn average_of_no_samples() {
        assert_eq!(Samples::default().avg(), Duration::ZERO);
    }
}
