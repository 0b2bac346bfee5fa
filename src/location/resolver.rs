//! Location resolver: orchestrates the fallback chain.
//!
//! Row flow:  already labelled → nearest known point (< 50 km) → Nominatim reverse → Unknown
//!
//! Every successful resolution is appended to the reference set, so later
//! rows can match against points resolved earlier in the same run. Row order
//! therefore changes results.

use super::cache::ReferenceSet;
use super::providers::ReverseGeocoder;
use super::types::{KnownPoint, Label, RowState};
use crate::table::{Row, Table};

/// Outcome of resolving one row: its terminal state and the label patch to
/// apply, if any. `AlreadyResolved` rows carry no patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub state: RowState,
    pub label: Option<Label>,
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub already_resolved: usize,
    pub resolved_offline: usize,
    pub resolved_online: usize,
    pub unresolved: usize,
    pub online_lookups: usize,
    pub reference_points: usize,
}

impl RunSummary {
    fn record(&mut self, state: RowState) {
        match state {
            RowState::AlreadyResolved => self.already_resolved += 1,
            RowState::ResolvedOffline => self.resolved_offline += 1,
            RowState::ResolvedOnline => self.resolved_online += 1,
            RowState::Unresolved => self.unresolved += 1,
        }
    }

    pub fn rows(&self) -> usize {
        self.already_resolved + self.resolved_offline + self.resolved_online + self.unresolved
    }
}

/// The location resolver with its fallback pipeline.
pub struct LocationResolver<G> {
    points: ReferenceSet,
    geocoder: G,
    online_lookups: usize,
}

impl<G: ReverseGeocoder> LocationResolver<G> {
    pub fn new(points: ReferenceSet, geocoder: G) -> Self {
        Self {
            points,
            geocoder,
            online_lookups: 0,
        }
    }

    /// Seed the reference set from every labelled row of `table`.
    pub fn for_table(table: &Table, geocoder: G) -> Self {
        let points = ReferenceSet::from_rows(table.rows());
        log::debug!("Seeded reference set with {} known points", points.len());
        Self::new(points, geocoder)
    }

    pub fn points(&self) -> &ReferenceSet {
        &self.points
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn online_lookups(&self) -> usize {
        self.online_lookups
    }

    /// Resolve a single row against the current reference set.
    pub fn resolve_row(&mut self, row: &Row) -> Resolution {
        // 1. Labelled rows are sources, never targets
        if row.is_resolved() {
            return Resolution {
                state: RowState::AlreadyResolved,
                label: None,
            };
        }

        // 2. Nearest known point
        if let Some((label, d)) = self.points.lookup(row.latitude, row.longitude) {
            log::debug!("Row {}: matched '{}' offline at {:.2} km", row.index, label, d);
            return self.accept(row, label, RowState::ResolvedOffline);
        }

        // 3. Nominatim reverse
        self.online_lookups += 1;
        match self.geocoder.reverse(row.latitude, row.longitude) {
            Ok(address) => match address.complete() {
                Some(label) => {
                    log::debug!("Row {}: resolved '{}' online", row.index, label);
                    return self.accept(row, label, RowState::ResolvedOnline);
                }
                None => log::debug!(
                    "Row {}: incomplete reverse result ({:?}, {:?})",
                    row.index,
                    address.city,
                    address.country
                ),
            },
            Err(e) => log::warn!(
                "Row {}: reverse lookup for ({}, {}) failed: {}",
                row.index,
                row.latitude,
                row.longitude,
                e
            ),
        }

        // 4. Nothing worked
        Resolution {
            state: RowState::Unresolved,
            label: Some(Label::unknown()),
        }
    }

    fn accept(&mut self, row: &Row, label: Label, state: RowState) -> Resolution {
        self.points
            .push(KnownPoint::new(row.latitude, row.longitude, label.clone()));
        Resolution {
            state,
            label: Some(label),
        }
    }

    /// Resolve every row of `table` in order, applying label patches as it goes.
    pub fn run(&mut self, table: &mut Table) -> RunSummary {
        let mut summary = RunSummary::default();
        for index in 0..table.len() {
            let Some(row) = table.row(index) else { continue };
            let resolution = self.resolve_row(&row);
            log::trace!("Row {}: {}", index, resolution.state);
            if let Some(label) = &resolution.label {
                table.apply(index, label);
            }
            summary.record(resolution.state);
        }
        summary.online_lookups = self.online_lookups;
        summary.reference_points = self.points.len();
        summary
    }
}
