use tokio::time::{Duration, Instant};

/// Short-lived memo of the last raw counter fetch, so the expensive probes
/// are not re-run on every caller within the TTL window. Caches the totals
/// themselves, never the derived rate.
pub struct TotalsCache {
    ttl: Duration,
    cached: Option<((u64, u64), Instant)>,
}

impl TotalsCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cached: None }
    }
    pub fn lookup(&self, now: Instant) -> Option<(u64, u64)> {
        let ((a, b), at) = self.cached?;
        if now.duration_since(at) < self.ttl {
            Some((a, b))
        } else {
            None
        }
    }
    pub fn store(&mut self, totals: (u64, u64), now: Instant) {
        self.cached = Some((totals, now));
    }
}

/// Turns a pair of monotonically increasing counters into a smoothed
/// per-second rate. A new rate is only computed once `min_interval` has
/// elapsed since the last accepted sample; until then the previous rate is
/// repeated and the baseline left alone.
pub struct RateSampler {
    last_sample: Option<(u64, u64, Instant)>,
    min_interval: Duration,
    last_rate: (f64, f64),
}

impl RateSampler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_sample: None,
            min_interval,
            last_rate: (0.0, 0.0),
        }
    }
    /// Ingests one poll's counter pair, read at `now` on the caller's
    /// clock, and returns the current rate estimate.
    pub fn sample(&mut self, a: u64, b: u64, now: Instant) -> (f64, f64) {
        let Some((last_a, last_b, at)) = self.last_sample else {
            // first reading, nothing to difference against yet
            self.last_sample = Some((a, b, now));
            return self.last_rate;
        };
        let elapsed = now.duration_since(at);
        if elapsed < self.min_interval {
            return self.last_rate;
        }
        // a counter that went backwards has reset; what it reads now is
        // what accumulated since the reset
        let delta_a = if a < last_a { a } else { a - last_a };
        let delta_b = if b < last_b { b } else { b - last_b };
        let secs = elapsed.as_secs_f64();
        self.last_rate = (ceil_rate(delta_a, secs), ceil_rate(delta_b, secs));
        self.last_sample = Some((a, b, now));
        self.last_rate
    }
}

// ceiling, so a trickle never displays as exactly zero
fn ceil_rate(delta: u64, secs: f64) -> f64 {
    if delta > 0 {
        (delta as f64 / secs).ceil()
    } else {
        0.0
    }
}
