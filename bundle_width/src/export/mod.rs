//! Plain-text export of analysis tables next to the source movie.
//!
//! Two comma-separated files are written:
//! - `<stem>_bundle_width_table.txt`: `time,bundle_mean,bundle_std,bundle_sem`
//! - `<stem>_all_histograms.txt`: one column per processed frame headed by
//!   its timestamp, short columns padded with empty fields
//!
//! NaN values are written as empty fields.

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analysis::{HistogramTable, MovieAnalysis, TimeSeriesTable};
use crate::error::{Error, Result};

pub const TIME_SERIES_SUFFIX: &str = "_bundle_width_table.txt";
pub const HISTOGRAMS_SUFFIX: &str = "_all_histograms.txt";

/// Files written by [`export_tables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub time_series: PathBuf,
    pub histograms: PathBuf,
}

impl ExportPaths {
    /// Output paths for `movie_path`, in the movie's directory.
    pub fn for_movie(movie_path: &Path) -> Self {
        Self {
            time_series: sibling_with_suffix(movie_path, TIME_SERIES_SUFFIX),
            histograms: sibling_with_suffix(movie_path, HISTOGRAMS_SUFFIX),
        }
    }
}

/// `<dir>/<stem><suffix>` for `path`.
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

/// Writes both tables of `analysis` next to `movie_path`.
pub fn export_tables(movie_path: &Path, analysis: &MovieAnalysis) -> Result<ExportPaths> {
    let paths = ExportPaths::for_movie(movie_path);

    write_file(&paths.time_series, |w| write_time_series(w, &analysis.time_series))?;
    write_file(&paths.histograms, |w| write_histograms(w, &analysis.histograms))?;

    tracing::info!(
        time_series = %paths.time_series.display(),
        histograms = %paths.histograms.display(),
        "Exported tables"
    );
    Ok(paths)
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let export_error = |source| Error::Export {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(export_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(export_error)?;
    writer.flush().map_err(export_error)
}

/// Writes the time series as CSV with a header line.
pub fn write_time_series<W: Write>(writer: &mut W, table: &TimeSeriesTable) -> io::Result<()> {
    writeln!(writer, "{}", TimeSeriesTable::COLUMNS.join(","))?;
    for row in table.rows() {
        writeln!(
            writer,
            "{},{},{},{}",
            format_value(row.time),
            format_value(row.bundle_mean),
            format_value(row.bundle_std),
            format_value(row.bundle_sem)
        )?;
    }
    Ok(())
}

/// Writes the histogram table as CSV: a header of timestamps, then one line
/// per width rank.
pub fn write_histograms<W: Write>(writer: &mut W, table: &HistogramTable) -> io::Result<()> {
    let header: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format_value(c.time))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in table.padded_rows() {
        let cells: Vec<String> = row
            .into_iter()
            .map(|cell| cell.map(format_value).unwrap_or_default())
            .collect();
        writeln!(writer, "{}", cells.join(","))?;
    }
    Ok(())
}

/// Shortest round-trip form; NaN becomes an empty field.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:?}")
    }
}
