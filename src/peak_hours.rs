use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Timelike};

use crate::error::{Error, Result};
use crate::models::PeakHours;
use crate::store::EntityStore;

/// Label reported for an hour bucket outside the day. Never a valid hour.
pub const UNRECOGNIZED_HOUR: &str = "Something went wrong";

const HOUR_LABELS: [&str; 24] = [
    "12 A.M", "1 A.M", "2 A.M", "3 A.M", "4 A.M", "5 A.M", "6 A.M", "7 A.M", "8 A.M", "9 A.M",
    "10 A.M", "11 A.M", "12 P.M", "1 P.M", "2 P.M", "3 P.M", "4 P.M", "5 P.M", "6 P.M", "7 P.M",
    "8 P.M", "9 P.M", "10 P.M", "11 P.M",
];

pub fn format_hour(hour: u32) -> Result<&'static str> {
    HOUR_LABELS
        .get(hour as usize)
        .copied()
        .ok_or_else(|| Error::InvalidInput(format!("hour {hour} is outside 0-23")))
}

/// Counts sign-ins per hour of day for visits starting in `[start, end]`.
/// Hours without visits are omitted; buckets are ordered by hour.
pub async fn peak_hours<S>(
    store: &S,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<PeakHours>>
where
    S: EntityStore + ?Sized,
{
    let sign_ins = store.sign_ins_between(start, end).await?;
    let mut buckets: BTreeMap<u32, usize> = BTreeMap::new();

    for sign_in in &sign_ins {
        *buckets.entry(sign_in.in_time.hour()).or_insert(0) += 1;
    }

    tracing::debug!(
        visits = sign_ins.len(),
        buckets = buckets.len(),
        "aggregated peak hours"
    );

    Ok(buckets
        .into_iter()
        .map(|(hour, count)| PeakHours::new(hour, count))
        .collect())
}

/// The recognized bucket with the most visits; the earliest hour wins ties.
pub fn busiest(hours: &[PeakHours]) -> Option<&PeakHours> {
    hours
        .iter()
        .filter(|h| h.is_recognized())
        .fold(None, |best: Option<&PeakHours>, candidate| match best {
            Some(current) if current.count >= candidate.count => Some(current),
            _ => Some(candidate),
        })
}
