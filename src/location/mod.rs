//! Location subsystem: labels coordinates with a city and country.
//!
//! Resolution first matches against labelled points already in the table,
//! then falls back to Nominatim reverse geocoding.

pub mod cache;
pub mod providers;
pub mod resolver;
pub mod types;

pub use cache::{ReferenceSet, OFFLINE_MATCH_RADIUS_KM};
pub use providers::{Nominatim, ReverseGeocoder};
pub use resolver::{LocationResolver, Resolution, RunSummary};
pub use types::{AddressLabel, KnownPoint, Label, LookupError, RowState, TableError, UNKNOWN};
