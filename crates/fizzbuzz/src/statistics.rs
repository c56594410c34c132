//! Per-request usage statistics.
//!
//! [`Statistics`] counts how many times each [`Request`] was recorded and keeps
//! track of the most recorded one. A single lock guards both the counts and
//! the top key, so every operation is linearizable and a reader never sees a
//! top key paired with a count from a different update.
//!
//! ## Tie-breaking
//!
//! The top key only changes when another key's count becomes strictly
//! greater. On equal counts the key that reached the count first stays on top.

use crate::Request;
use parking_lot::Mutex;
use std::collections::HashMap;

/// The recorded usage of a single [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestStatistic {
    pub request: Request,
    pub total: u64,
}

impl RequestStatistic {
    pub const fn new(request: Request, total: u64) -> Self {
        Self { request, total }
    }
}

/// Records render requests and answers usage queries.
///
/// Implementations must be safe to share between concurrent renders without
/// external locking.
pub trait StatisticRecorder: Send + Sync {
    /// Increments the count for `request` by one.
    fn record(&self, request: &Request);

    /// Returns the count recorded for `request`, or `None` if it was never
    /// recorded.
    fn get_statistic(&self, request: &Request) -> Option<RequestStatistic>;

    /// Returns the most recorded request, or `None` if nothing was recorded.
    fn get_top_statistic(&self) -> Option<RequestStatistic>;

    /// Clears every count and the top key.
    fn reset(&self);
}

#[derive(Debug, Default)]
struct Totals {
    counts: HashMap<Request, u64>,
    top: Request,
}

impl Totals {
    fn count(&self, request: &Request) -> u64 {
        self.counts.get(request).copied().unwrap_or(0)
    }

    fn statistic(&self, request: &Request) -> Option<RequestStatistic> {
        match self.count(request) {
            0 => None,
            total => Some(RequestStatistic::new(request.clone(), total)),
        }
    }
}

/// In-memory [`StatisticRecorder`] guarded by a single mutex.
///
/// Counts live for the lifetime of the instance; nothing is persisted.
#[derive(Debug, Default)]
pub struct Statistics {
    totals: Mutex<Totals>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatisticRecorder for Statistics {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    fn record(&self, request: &Request) {
        let mut totals = self.totals.lock();
        let top_total = totals.count(&totals.top);

        let total = if let Some(total) = totals.counts.get_mut(request) {
            *total += 1;
            *total
        } else {
            totals.counts.insert(request.clone(), 1);
            1
        };

        if total > top_total {
            totals.top = request.clone();
        }
    }

    fn get_statistic(&self, request: &Request) -> Option<RequestStatistic> {
        self.totals.lock().statistic(request)
    }

    fn get_top_statistic(&self) -> Option<RequestStatistic> {
        let totals = self.totals.lock();
        totals.statistic(&totals.top)
    }

    fn reset(&self) {
        *self.totals.lock() = Totals::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn request_a() -> Request {
        Request::new(100, 3, 5, "fizz", "buzz")
    }

    fn request_b() -> Request {
        Request::new(20, 3, 5, "A", "B")
    }

    #[test]
    fn unrecorded_request_is_absent() {
        let stats = Statistics::new();
        assert_eq!(stats.get_statistic(&request_a()), None);
        assert_eq!(stats.get_top_statistic(), None);
    }

    #[test]
    fn record_counts_each_call() {
        let stats = Statistics::new();
        for _ in 0..3 {
            stats.record(&request_b());
        }
        assert_eq!(
            stats.get_statistic(&request_b()),
            Some(RequestStatistic::new(request_b(), 3))
        );
        assert_eq!(
            stats.get_top_statistic(),
            Some(RequestStatistic::new(request_b(), 3))
        );
    }

    #[test]
    fn top_moves_when_strictly_exceeded() {
        let stats = Statistics::new();
        stats.record(&request_a());
        stats.record(&request_b());
        stats.record(&request_b());

        let top = stats.get_top_statistic().unwrap();
        assert_eq!(top.request, request_b());
        assert_eq!(top.total, 2);
    }

    #[test]
    fn top_stays_on_tie() {
        let stats = Statistics::new();
        stats.record(&request_a());
        stats.record(&request_a());
        stats.record(&request_b());
        stats.record(&request_b());

        let top = stats.get_top_statistic().unwrap();
        assert_eq!(top.request, request_a());
        assert_eq!(top.total, 2);

        stats.record(&request_b());
        assert_eq!(stats.get_top_statistic().unwrap().request, request_b());
    }

    #[test]
    fn default_request_can_become_top() {
        // The empty request is also the initial top placeholder.
        let stats = Statistics::new();
        stats.record(&Request::default());
        assert_eq!(
            stats.get_top_statistic(),
            Some(RequestStatistic::new(Request::default(), 1))
        );
    }

    #[test]
    fn reset_clears_everything() {
        let stats = Statistics::new();
        stats.record(&request_a());
        stats.record(&request_b());
        stats.reset();

        assert_eq!(stats.get_statistic(&request_a()), None);
        assert_eq!(stats.get_top_statistic(), None);

        stats.record(&request_b());
        assert_eq!(
            stats.get_top_statistic(),
            Some(RequestStatistic::new(request_b(), 1))
        );
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let stats = Arc::new(Statistics::new());
        let threads = 8;
        let per_thread = 1_000;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..per_thread {
                        stats.record(&request_a());
                        if t % 2 == 0 {
                            stats.record(&request_b());
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            stats.get_statistic(&request_a()).unwrap().total,
            threads * per_thread
        );
        assert_eq!(
            stats.get_statistic(&request_b()).unwrap().total,
            threads / 2 * per_thread
        );
        assert_eq!(
            stats.get_top_statistic(),
            Some(RequestStatistic::new(request_a(), threads * per_thread))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn statistic_serializes_as_request_and_total() {
        let json = serde_json::to_value(RequestStatistic::new(request_b(), 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "request": {"limit": 20, "int1": 3, "int2": 5, "str1": "A", "str2": "B"},
                "total": 3
            })
        );
    }
}
