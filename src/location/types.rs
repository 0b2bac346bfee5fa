//! Core types for the location subsystem.

use std::fmt;

/// Sentinel written to city/country cells that have no label.
pub const UNKNOWN: &str = "Unknown";

/// Whether a label cell carries a real value (not empty, not the placeholder).
pub fn is_label(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && v != UNKNOWN
}

/// A labelled coordinate that offline lookups can match against.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownPoint {
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub country: String,
}

impl KnownPoint {
    pub fn new(lat: f64, lon: f64, label: Label) -> Self {
        Self {
            lat,
            lon,
            city: label.city,
            country: label.country,
        }
    }

    pub fn label(&self) -> Label {
        Label {
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }
}

/// A complete city/country pair. Applied to a row as a field patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub city: String,
    pub country: String,
}

impl Label {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    /// The placeholder pair written to rows nothing could resolve.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// What a reverse-geocoding service returned. Either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressLabel {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AddressLabel {
    /// Both halves present, or nothing. Partial answers are rejected.
    pub fn complete(&self) -> Option<Label> {
        match (&self.city, &self.country) {
            (Some(city), Some(country)) => Some(Label::new(city.clone(), country.clone())),
            _ => None,
        }
    }
}

/// Terminal state of a single row after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    AlreadyResolved,
    ResolvedOffline,
    ResolvedOnline,
    Unresolved,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyResolved => write!(f, "already resolved"),
            Self::ResolvedOffline => write!(f, "resolved offline"),
            Self::ResolvedOnline => write!(f, "resolved online"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Remote lookup failures. Never fatal to a run.
#[derive(Debug)]
pub enum LookupError {
    Network(String),
    Status(u16),
    InvalidResponse(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Status(code) => write!(f, "Unexpected HTTP status {}", code),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

/// Structural failures reading or writing the table. These abort the run.
#[derive(Debug)]
pub enum TableError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
    InvalidCoordinate {
        line: usize,
        column: &'static str,
        value: String,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::MissingColumn(name) => write!(f, "Missing required column '{}'", name),
            Self::InvalidCoordinate { line, column, value } => write!(
                f,
                "Invalid {} '{}' on data line {}",
                column, value, line
            ),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TableError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}
