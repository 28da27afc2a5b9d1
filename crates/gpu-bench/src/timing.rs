//! Host-side wall-clock timing

use std::time::{Duration, Instant};

/// Running timer; [`HostTimer::stop`] turns it into a [`TimingSample`]
pub struct HostTimer {
    start: Instant,
}

impl HostTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn stop(self) -> TimingSample {
        TimingSample {
            start: self.start,
            end: Instant::now(),
        }
    }
}

/// Start and end instants on the monotonic clock; `end >= start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    start: Instant,
    end: Instant,
}

impl TimingSample {
    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn elapsed(&self) -> Duration {
        self.end.duration_since(self.start)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// Time `f`, returning its output with the sample
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, TimingSample) {
    let timer = HostTimer::start();
    let output = f();
    (output, timer.stop())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_ordered() {
        let sample = HostTimer::start().stop();
        assert!(sample.end() >= sample.start());
        assert!(sample.elapsed_ms() >= 0.0);
    }

    #[test]
    fn test_measure_covers_sleep() {
        let (value, sample) = measure(|| {
            std::thread::sleep(Duration::from_millis(5));
            7
        });
        assert_eq!(value, 7);
        assert!(sample.elapsed() >= Duration::from_millis(5));
        assert!(sample.elapsed_ms() >= 5.0);
    }
}
