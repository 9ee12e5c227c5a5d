//! Feed loading error types.

/// Errors that make a GTFS archive unusable.
///
/// Row-level problems (bad coordinates, non-numeric sequences) are not
/// represented here; those rows are dropped during sequencing.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The bytes are not a zip archive
    #[error("the downloaded file is not a valid zip archive: {0}")]
    InvalidArchive(#[source] zip::result::ZipError),

    /// A required table is not present in the archive
    #[error("{0} not found inside GTFS zip")]
    MissingTable(&'static str),

    /// A table lacks one or more mandatory columns
    #[error("{table} missing required columns: {}", missing.join(","))]
    Schema {
        table: &'static str,
        missing: Vec<String>,
    },

    /// The header row or an archive entry could not be read as CSV
    #[error("impossible to read csv file '{table}'")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// Reading an archive entry failed
    #[error("impossible to read '{table}' from the archive")]
    Io {
        table: &'static str,
        #[source]
        source: zip::result::ZipError,
    },
}
