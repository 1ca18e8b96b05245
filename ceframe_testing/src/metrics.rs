//! Counter lookups against a `metrics_util` debugging snapshot.

use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, Snapshotter},
};

/// Entries of one debugging snapshot.
pub type Recorded = Vec<(
    CompositeKey,
    Option<::metrics::Unit>,
    Option<::metrics::SharedString>,
    DebugValue,
)>;

/// Take a single snapshot of `snapshotter`.
///
/// Counters are drained by each snapshot, so tests take one and query it for
/// every counter they check.
#[must_use]
pub fn recorded(snapshotter: &Snapshotter) -> Recorded { snapshotter.snapshot().into_vec() }

/// Value of the counter `name` whose labels include every pair in `labels`,
/// or zero when no such counter was recorded.
#[must_use]
pub fn counter_value(recorded: &Recorded, name: &str, labels: &[(&str, &str)]) -> u64 {
    recorded
        .iter()
        .filter(|(key, ..)| key.key().name() == name)
        .filter(|(key, ..)| {
            labels.iter().all(|(label, value)| {
                key.key()
                    .labels()
                    .any(|l| l.key() == *label && l.value() == *value)
            })
        })
        .map(|(.., value)| match value {
            DebugValue::Counter(count) => *count,
            _ => 0,
        })
        .sum()
}
