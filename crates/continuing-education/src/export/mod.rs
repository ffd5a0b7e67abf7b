//! Spreadsheet exports.
//!
//! Records are flattened into rows of a [`Workbook`], the generic description
//! a spreadsheet builder consumes, and rendered as CSV.

pub mod admission;
pub mod prospect;

use std::io::Write;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub use admission::{admission_row, admission_rows, admission_workbook, AdmissionExportFilters};
pub use prospect::{prospect_rows, prospect_workbook};

/// Response header carrying the workbook description and its filters.
pub const EXPORT_DESCRIPTION_HEADER: &str = "x-export-description";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Generic workbook parameters: titles, content and the filter criteria that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workbook {
    pub description: String,
    pub username: String,
    pub filename: String,
    pub worksheet_title: String,
    pub header_titles: Vec<String>,
    pub content: Vec<Vec<String>>,
    /// `(form field label, value)` in form order.
    pub filters: Vec<(String, String)>,
}

impl Workbook {
    /// Description metadata with the filter criteria appended.
    pub fn full_description(&self) -> String {
        if self.filters.is_empty() {
            return self.description.clone();
        }

        let criteria = self
            .filters
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        format!("{} ({})", self.description, criteria)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.header_titles)?;
        for row in &self.content {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

impl IntoResponse for Workbook {
    fn into_response(self) -> Response {
        let body = match self.to_csv() {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, filename = %self.filename, "export rendering failed");
                return crate::error::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                );
            }
        };

        let disposition = format!("attachment; filename=\"{}.csv\"", self.filename);
        let mut response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            body,
        )
            .into_response();

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        if let Ok(value) = HeaderValue::from_bytes(self.full_description().as_bytes()) {
            headers.insert(HeaderName::from_static(EXPORT_DESCRIPTION_HEADER), value);
        }
        response
    }
}
