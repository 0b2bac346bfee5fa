pub mod geo;
pub mod location;
pub mod table;

use location::{LocationResolver, ReverseGeocoder, RunSummary, TableError};
use std::path::Path;
use table::Table;

/// Load the table at `path`, label every unlabelled row, and write it back
/// to the same path.
///
/// Only structural problems with the table are errors. Failed lookups end up
/// as `Unknown` labels.
pub fn run_file<G: ReverseGeocoder>(path: impl AsRef<Path>, geocoder: G) -> Result<RunSummary, TableError> {
    let path = path.as_ref();
    let mut table = Table::load(path)?;

    let mut resolver = LocationResolver::for_table(&table, geocoder);
    let summary = resolver.run(&mut table);

    table.save(path)?;
    log::info!(
        "{}: {} rows, {} already labelled, {} offline, {} online, {} unknown ({} lookups, {} reference points)",
        path.display(),
        summary.rows(),
        summary.already_resolved,
        summary.resolved_offline,
        summary.resolved_online,
        summary.unresolved,
        summary.online_lookups,
        summary.reference_points,
    );
    Ok(summary)
}
