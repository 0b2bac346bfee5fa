//! In-memory reference set of labelled points for offline lookups.
//!
//! Seeded once from the rows that already carry labels, then grows
//! append-only as rows are resolved. Lives for one run; never persisted.

use super::types::{KnownPoint, Label};
use crate::geo::haversine_km;
use crate::table::Row;

/// Nearest-point matches at or beyond this distance are rejected.
pub const OFFLINE_MATCH_RADIUS_KM: f64 = 50.0;

/// The growing set of known points.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    points: Vec<KnownPoint>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every already-labelled row, in row order.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
    {
        let points = rows
            .into_iter()
            .filter_map(|row| {
                let label = row.label()?;
                Some(KnownPoint::new(row.latitude, row.longitude, label))
            })
            .collect();
        Self { points }
    }

    /// Append a resolved point. Duplicates are kept.
    pub fn push(&mut self, point: KnownPoint) {
        self.points.push(point);
    }

    /// Closest point and its distance in km. Equidistant points keep the
    /// earliest one, since a later point must be strictly closer to win.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<(&KnownPoint, f64)> {
        let mut best: Option<(&KnownPoint, f64)> = None;
        for point in &self.points {
            let d = haversine_km(lat, lon, point.lat, point.lon);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((point, d));
            }
        }
        best
    }

    /// Label of the nearest point if it lies strictly within
    /// [`OFFLINE_MATCH_RADIUS_KM`].
    pub fn lookup(&self, lat: f64, lon: f64) -> Option<(Label, f64)> {
        let (point, d) = self.nearest(lat, lon)?;
        if d < OFFLINE_MATCH_RADIUS_KM {
            Some((point.label(), d))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownPoint> {
        self.points.iter()
    }
}
