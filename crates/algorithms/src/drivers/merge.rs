//! Nearest-timestamp join of wave and rain series

use chrono::Duration;
use shorecast_core::series::{HourlyDriver, RainObservation, WaveObservation};

/// Pair every wave observation with the rain observation nearest in time.
///
/// Both inputs must be sorted by time. Rain further away than `tolerance`
/// leaves `tp` empty; equidistant candidates resolve to the earlier one.
pub fn merge_nearest(
    waves: &[WaveObservation],
    rain: &[RainObservation],
    tolerance: Duration,
) -> Vec<HourlyDriver> {
    waves
        .iter()
        .map(|w| {
            let idx = rain.partition_point(|r| r.time < w.time);
            let after = rain.get(idx);
            let before = idx.checked_sub(1).and_then(|i| rain.get(i));

            let nearest = match (before, after) {
                (Some(b), Some(a)) => {
                    if a.time - w.time < w.time - b.time {
                        Some(a)
                    } else {
                        Some(b)
                    }
                }
                (b, a) => b.or(a),
            };

            let tp = nearest
                .filter(|r| {
                    let gap = if r.time >= w.time {
                        r.time - w.time
                    } else {
                        w.time - r.time
                    };
                    gap <= tolerance
                })
                .and_then(|r| r.tp);

            HourlyDriver {
                time: w.time,
                swh: w.swh,
                mwp: w.mwp,
                tp,
            }
        })
        .collect()
}
