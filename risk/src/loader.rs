//! Return series loading
//!
//! Reads `date,ret` CSV files into a [`ReturnSeries`] sorted by date. The
//! [`SeriesCache`] is an explicit value owned by the caller; a cached entry
//! is reused only while the file's modification time and size are
//! unchanged.

use crate::error::{RiskError, Result};
use crate::series::ReturnSeries;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct ReturnRecord {
    #[serde(default)]
    date: Option<String>,
    /// Empty cells are missing returns
    ret: Option<f64>,
}

/// Parse a return series from CSV with a `ret` column and optional `date`
///
/// Dated rows are sorted by date; a file must either date every row or
/// none of them.
pub fn read_returns_csv<R: io::Read>(reader: R) -> Result<ReturnSeries> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows: Vec<(Option<NaiveDate>, f64)> = Vec::new();

    for (line, record) in rdr.deserialize::<ReturnRecord>().enumerate() {
        let record = record?;
        let date = match record.date.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(text) => Some(NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
                RiskError::DataError(format!("Row {}: bad date '{}': {}", line + 1, text, e))
            })?),
        };
        rows.push((date, record.ret.unwrap_or(f64::NAN)));
    }

    let dated = rows.iter().filter(|(d, _)| d.is_some()).count();
    if dated == 0 {
        return Ok(ReturnSeries::new(rows.into_iter().map(|(_, r)| r).collect()));
    }
    if dated != rows.len() {
        return Err(RiskError::DataError(format!(
            "{} of {} rows have a date; expected all or none",
            dated,
            rows.len()
        )));
    }

    rows.sort_by_key(|(d, _)| *d);
    let (dates, values): (Vec<NaiveDate>, Vec<f64>) =
        rows.into_iter().filter_map(|(d, r)| d.map(|d| (d, r))).unzip();
    ReturnSeries::with_dates(dates, values)
}

/// Load a return series from a CSV file
pub fn load_returns_csv(path: impl AsRef<Path>) -> Result<ReturnSeries> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let series = read_returns_csv(io::BufReader::new(file))?;
    info!("Loaded {} returns from {}", series.len(), path.display());
    Ok(series)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

/// Caller-owned cache of loaded series keyed by path
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<PathBuf, (FileStamp, Arc<ReturnSeries>)>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached series, reloading when the file changed
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Arc<ReturnSeries>> {
        let path = path.as_ref();
        let stamp = FileStamp::of(path)?;

        if let Some((cached, series)) = self.entries.get(path) {
            if *cached == stamp {
                debug!("Series cache hit for {}", path.display());
                return Ok(Arc::clone(series));
            }
            debug!("Series cache stale for {}", path.display());
        }

        let series = Arc::new(load_returns_csv(path)?);
        self.entries
            .insert(path.to_path_buf(), (stamp, Arc::clone(&series)));
        Ok(series)
    }

    pub fn invalidate(&mut self, path: impl AsRef<Path>) {
        self.entries.remove(path.as_ref());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
