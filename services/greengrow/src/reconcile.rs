//! Sensor list reconciliation
//!
//! Each poll fetches the full sensor list, but most ticks change nothing.
//! Reconciliation merges the fresh list into the current one while keeping
//! the `Arc` identity of every unchanged entry, so observers comparing
//! handles (the view, tests) can skip work when nothing moved.

use std::sync::Arc;

use crate::models::Sensor;

/// Sensor snapshot shared between the poll engine and the view
///
/// Entries are `Arc`ed individually so reconciliation can carry unchanged
/// sensors over to the next snapshot without copying them.
pub type SensorCollection = Arc<Vec<Arc<Sensor>>>;

/// An empty snapshot.
pub fn empty() -> SensorCollection {
    Arc::new(Vec::new())
}

/// Wrap a freshly fetched sensor list into a snapshot.
pub fn from_sensors(sensors: Vec<Sensor>) -> SensorCollection {
    Arc::new(sensors.into_iter().map(Arc::new).collect())
}

/// Merge `incoming` into `previous`, preserving identity of unchanged entries.
///
/// - If `previous` is empty or the lengths differ, the set of sensors itself
///   changed and `incoming` is returned verbatim.
/// - Otherwise each previous sensor is carried over unchanged unless the
///   incoming sensor with the same id has a different `latest_reading`, in
///   which case a new record is built from the previous static fields and
///   the incoming reading. Iteration order is `previous`'s order.
/// - If no entry changed, the `previous` handle itself is returned, so a
///   quiet poll leaves the snapshot pointer-identical.
///
/// Duplicate ids in `incoming` are unsupported; the first match wins.
pub fn reconcile(previous: &SensorCollection, incoming: SensorCollection) -> SensorCollection {
    if previous.is_empty() || previous.len() != incoming.len() {
        tracing::debug!(
            "Sensor list structure changed ({} -> {}), replacing snapshot",
            previous.len(),
            incoming.len()
        );
        return incoming;
    }

    let merged: Vec<Arc<Sensor>> = previous
        .iter()
        .map(|current| {
            let update = incoming.iter().find(|s| s.id == current.id);
            match update {
                Some(update) if update.latest_reading != current.latest_reading => {
                    tracing::debug!("Sensor {} reading changed", current.id);
                    Arc::new(Sensor {
                        latest_reading: update.latest_reading.clone(),
                        ..(**current).clone()
                    })
                }
                _ => Arc::clone(current),
            }
        })
        .collect();

    let changed = merged
        .iter()
        .zip(previous.iter())
        .any(|(merged, previous)| !Arc::ptr_eq(merged, previous));

    if changed {
        Arc::new(merged)
    } else {
        Arc::clone(previous)
    }
}
