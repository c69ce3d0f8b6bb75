//! Re-bucketing of observation streams into fixed-width time windows.
//!
//! Batch downloads write one file per mission per window, so a 24-hour pull
//! with 6-hour buckets yields up to four files per balloon. Window k covers
//! `[start + k*bucket_hours, start + (k+1)*bucket_hours)`; every observation
//! lands in exactly one window.

use std::collections::btree_map;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::WindborneError;
use crate::models::Observation;
use crate::Result;

/// Default window width in hours.
pub const DEFAULT_BUCKET_HOURS: f64 = 6.0;

/// Identity of one output bucket: the window start and the mission it holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BucketKey {
    /// Start of the time window (UTC)
    pub start: DateTime<Utc>,
    /// Mission name (or id when the name is unknown)
    pub mission: String,
}

impl BucketKey {
    /// File name for this bucket, e.g. `WindBorne_W-1958_2024-12-01_06_6h.json`.
    #[must_use]
    pub fn filename(&self, bucket_hours: f64, extension: &str) -> String {
        format!(
            "WindBorne_{}_{}_{}h.{}",
            self.mission,
            self.start.format("%Y-%m-%d_%H"),
            format_bucket_hours(bucket_hours),
            extension
        )
    }
}

/// Render the bucket width without a trailing `.0` (`6`, not `6.0`).
#[must_use]
pub fn format_bucket_hours(bucket_hours: f64) -> String {
    if bucket_hours.fract() == 0.0 {
        format!("{}", bucket_hours as i64)
    } else {
        format!("{bucket_hours}")
    }
}

/// Accumulates observations into (window, mission) buckets.
#[derive(Debug)]
pub struct Buckets {
    start: DateTime<Utc>,
    bucket_hours: f64,
    bucket_seconds: i64,
    map: BTreeMap<BucketKey, Vec<Observation>>,
}

impl Buckets {
    /// Create an empty bucket set anchored at `start_timestamp`.
    pub fn new(start_timestamp: i64, bucket_hours: f64) -> Result<Self> {
        if !(bucket_hours > 0.0) {
            return Err(WindborneError::validation(format!(
                "bucket hours must be positive, got {bucket_hours}"
            )));
        }
        let start = DateTime::<Utc>::from_timestamp(start_timestamp, 0).ok_or_else(|| {
            WindborneError::validation(format!("timestamp {start_timestamp} is out of range"))
        })?;
        Ok(Self {
            start,
            bucket_hours,
            bucket_seconds: (bucket_hours * 3600.0).round() as i64,
            map: BTreeMap::new(),
        })
    }

    /// Window width in hours.
    #[must_use]
    pub fn bucket_hours(&self) -> f64 {
        self.bucket_hours
    }

    /// Place one observation in its window, returning the bucket key it
    /// landed in. Observations with unrepresentable timestamps are dropped.
    pub fn insert(&mut self, observation: Observation) -> Option<BucketKey> {
        let Some(observed_at) = DateTime::<Utc>::from_timestamp(observation.timestamp, 0) else {
            warn!(
                timestamp = observation.timestamp,
                "dropping observation with out-of-range timestamp"
            );
            return None;
        };

        let offset = (observed_at - self.start).num_seconds();
        let k = offset.div_euclid(self.bucket_seconds);
        let key = BucketKey {
            start: self.start + chrono::Duration::seconds(k * self.bucket_seconds),
            mission: observation.mission_key().to_string(),
        };
        self.map.entry(key.clone()).or_default().push(observation);
        Some(key)
    }

    /// Bucket a whole batch.
    pub fn extend(&mut self, observations: impl IntoIterator<Item = Observation>) {
        for observation in observations {
            self.insert(observation);
        }
    }

    /// Observations in one bucket.
    #[must_use]
    pub fn get(&self, key: &BucketKey) -> Option<&[Observation]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Iterate buckets in (window, mission) order.
    pub fn iter(&self) -> btree_map::Iter<'_, BucketKey, Vec<Observation>> {
        self.map.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total observations across all buckets.
    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}

impl IntoIterator for Buckets {
    type Item = (BucketKey, Vec<Observation>);
    type IntoIter = btree_map::IntoIter<BucketKey, Vec<Observation>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: i64 = 1733032800; // 2024-12-01 06:00:00 UTC

    fn obs(timestamp: i64, mission: &str) -> Observation {
        Observation {
            id: None,
            timestamp,
            latitude: Some(0.0),
            longitude: Some(0.0),
            altitude: None,
            humidity: None,
            mission_name: Some(mission.to_string()),
            mission_id: None,
            pressure: None,
            specific_humidity: None,
            speed_u: None,
            speed_v: None,
            temperature: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_every_observation_lands_in_exactly_one_bucket() {
        // 24 hours of observations every 10 minutes, 6-hour buckets
        let mut buckets = Buckets::new(START, 6.0).unwrap();
        let observations: Vec<_> = (0..(24 * 6))
            .map(|i| obs(START + i * 600, "W-1958"))
            .collect();
        let total = observations.len();
        buckets.extend(observations);

        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets.observation_count(), total);

        // Boundaries at start + k * 6h
        let starts: Vec<i64> = buckets.iter().map(|(k, _)| k.start.timestamp()).collect();
        assert_eq!(
            starts,
            vec![
                START,
                START + 6 * 3600,
                START + 12 * 3600,
                START + 18 * 3600
            ]
        );

        // Every bucket's members fall inside its window
        for (key, members) in buckets.iter() {
            let window_start = key.start.timestamp();
            for member in members {
                assert!(member.timestamp >= window_start);
                assert!(member.timestamp < window_start + 6 * 3600);
            }
        }
    }

    #[test]
    fn test_boundary_observation_goes_to_next_bucket() {
        let mut buckets = Buckets::new(START, 6.0).unwrap();
        buckets.insert(obs(START + 6 * 3600, "W-1958"));
        let (key, _) = buckets.iter().next().unwrap();
        assert_eq!(key.start.timestamp(), START + 6 * 3600);
    }

    #[test]
    fn test_missions_bucket_separately() {
        let mut buckets = Buckets::new(START, 6.0).unwrap();
        buckets.insert(obs(START + 60, "W-1958"));
        buckets.insert(obs(START + 60, "W-1960"));
        assert_eq!(buckets.len(), 2);
    }

    #[test]
    fn test_filename_scheme() {
        let key = BucketKey {
            start: DateTime::<Utc>::from_timestamp(START, 0).unwrap(),
            mission: "W-1958".to_string(),
        };
        assert_eq!(
            key.filename(6.0, "json"),
            "WindBorne_W-1958_2024-12-01_06_6h.json"
        );
        assert_eq!(
            key.filename(2.5, "csv"),
            "WindBorne_W-1958_2024-12-01_06_2.5h.csv"
        );
    }

    #[test]
    fn test_rejects_nonpositive_width() {
        assert!(Buckets::new(START, 0.0).is_err());
        assert!(Buckets::new(START, -6.0).is_err());
    }
}
