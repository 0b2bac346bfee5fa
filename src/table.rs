//! Delimited coordinate table: load, patch labels, write back.
//!
//! Only the `city` and `country` cells are ever rewritten. Every other cell,
//! the column order and the row order round-trip untouched.

use crate::location::types::{is_label, Label, TableError, UNKNOWN};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;

/// A row snapshot as seen by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
}

impl Row {
    /// Resolved iff both labels are real values.
    pub fn is_resolved(&self) -> bool {
        is_label(&self.city) && is_label(&self.country)
    }

    pub fn label(&self) -> Option<Label> {
        if self.is_resolved() {
            Some(Label::new(self.city.clone(), self.country.clone()))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    latitude: usize,
    longitude: usize,
    city: usize,
    country: usize,
}

/// The full table held in memory for one run.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
    coords: Vec<(f64, f64)>,
    columns: Columns,
}

impl Table {
    /// Read a table with a header line. `latitude` and `longitude` are required;
    /// `city` and `country` are appended (filled with the placeholder) when absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();

        let latitude = column_index(&headers, "latitude").ok_or(TableError::MissingColumn("latitude"))?;
        let longitude = column_index(&headers, "longitude").ok_or(TableError::MissingColumn("longitude"))?;
        let city = column_index(&headers, "city").unwrap_or_else(|| append_column(&mut headers, "city"));
        let country =
            column_index(&headers, "country").unwrap_or_else(|| append_column(&mut headers, "country"));
        let columns = Columns { latitude, longitude, city, country };

        let mut records = Vec::new();
        let mut coords = Vec::new();
        for (n, result) in rdr.records().enumerate() {
            let record = result?;
            let mut cells: Vec<String> = record.iter().map(String::from).collect();
            cells.resize(headers.len(), UNKNOWN.to_string());

            let lat = parse_coordinate(&cells[latitude], n + 1, "latitude")?;
            let lon = parse_coordinate(&cells[longitude], n + 1, "longitude")?;
            coords.push((lat, lon));
            records.push(cells);
        }

        log::debug!("Loaded {} rows ({} columns)", records.len(), headers.len());
        Ok(Self { headers, records, coords, columns })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Snapshot of row `index`.
    pub fn row(&self, index: usize) -> Option<Row> {
        let cells = self.records.get(index)?;
        let (latitude, longitude) = self.coords[index];
        Some(Row {
            index,
            latitude,
            longitude,
            city: cells[self.columns.city].clone(),
            country: cells[self.columns.country].clone(),
        })
    }

    /// All rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.records.len()).filter_map(move |i| self.row(i))
    }

    /// Overwrite the label cells of row `index`.
    pub fn apply(&mut self, index: usize, label: &Label) {
        if let Some(cells) = self.records.get_mut(index) {
            cells[self.columns.city] = label.city.clone();
            cells[self.columns.country] = label.country.clone();
        }
    }

    /// Write the header and every record, in order, to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let mut wtr = WriterBuilder::new().from_path(path)?;
        wtr.write_record(&self.headers)?;
        for record in &self.records {
            wtr.write_record(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn append_column(headers: &mut Vec<String>, name: &str) -> usize {
    headers.push(name.to_string());
    headers.len() - 1
}

fn parse_coordinate(raw: &str, line: usize, column: &'static str) -> Result<f64, TableError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TableError::InvalidCoordinate {
            line,
            column,
            value: raw.to_string(),
        })
}
