use std::fmt;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};
use thiserror::Error;

use super::grid::WavelengthGrid;
use super::model::{FilterCurve, FilterSet};
use super::spline::{BoundedSpline, SplineError};

/// Value returned for wavelengths outside a curve's measured range.
///
/// Small but non-zero: a hard zero would make every stack containing the
/// filter collapse to zero there, which reads as "blocks all light".
pub const DEFAULT_FALLBACK: f64 = 1e-4;

/// Wavelengths above this are taken to be in nm and converted to µm.
const NM_THRESHOLD: f64 = 100.0;
/// Transmissions above this are taken to be in percent.
const PERCENT_THRESHOLD: f64 = 1.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Wavelength,
    Transmission,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Wavelength => write!(f, "wavelength"),
            ColumnKind::Transmission => write!(f, "transmission"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: {kind} column not found (headers: {headers:?})", .path.display())]
    ColumnNotFound {
        path: PathBuf,
        kind: ColumnKind,
        headers: Vec<String>,
    },

    #[error("{}, data row {row}, column '{column}': '{value}' is not a number", .path.display())]
    InvalidNumber {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{}: cannot build interpolant: {source}", .path.display())]
    Curve {
        path: PathBuf,
        #[source]
        source: SplineError,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: cannot read spreadsheet: {reason}", .path.display())]
    Spreadsheet { path: PathBuf, reason: String },

    #[error("{}: unsupported file type (expected .csv or .xlsx)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("downloading curves is disabled ({url})")]
    RemoteDisabled { url: String },
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Turns curve files into [`FilterCurve`]s sampled on one grid.
#[derive(Debug, Clone)]
pub struct CurveLoader {
    grid: WavelengthGrid,
    fallback: f64,
}

impl CurveLoader {
    pub fn new(grid: WavelengthGrid, fallback: f64) -> Self {
        Self { grid, fallback }
    }

    pub fn grid(&self) -> &WavelengthGrid {
        &self.grid
    }

    /// Load one `.csv` or `.xlsx` file and resample it on the grid.
    pub fn load(&self, path: &Path) -> Result<FilterCurve, LoadError> {
        let name = filter_name(path);
        log::debug!("Found filter {name} at {}", path.display());

        let csv_path = match extension(path).as_str() {
            "csv" => path.to_path_buf(),
            "xlsx" => csv_from_xlsx(path)?,
            _ => {
                return Err(LoadError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let spline = self.interpolant(&csv_path)?;
        let samples = spline.sample(self.grid.points());
        log::debug!("Interpolation generated for {}", csv_path.display());
        Ok(FilterCurve::new(name, samples))
    }

    /// Parse a CSV file, normalise units, and build its bounded interpolant.
    pub fn interpolant(&self, path: &Path) -> Result<BoundedSpline, LoadError> {
        let mut raw = read_columns(path)?;
        raw.normalize_units(path);
        BoundedSpline::new(raw.wavelength, raw.transmission, self.fallback).map_err(|source| {
            LoadError::Curve {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Load every curve file in `dir`. Failing files are collected in the
    /// report; they never abort the batch.
    pub fn scan_directory(&self, dir: &Path) -> Result<ScanReport, LoadError> {
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_curve_file(p))
            .collect();
        paths.sort();

        let mut report = ScanReport::default();
        for path in paths {
            let name = filter_name(&path);
            if report.filters.contains(&name) {
                log::debug!(
                    "Skipping {}: filter '{name}' already loaded",
                    path.display()
                );
                report.skipped.push(path);
                continue;
            }
            match self.load(&path) {
                Ok(curve) => {
                    report.filters.insert(curve);
                }
                Err(e) => {
                    log::error!("{e}");
                    report.failures.push((path, e));
                }
            }
        }

        log::info!(
            "Loaded {} filter(s) from {} ({} failed)",
            report.filters.len(),
            dir.display(),
            report.failures.len()
        );
        Ok(report)
    }
}

/// Outcome of [`CurveLoader::scan_directory`].
#[derive(Debug, Default)]
pub struct ScanReport {
    pub filters: FilterSet,
    pub failures: Vec<(PathBuf, LoadError)>,
    /// Files whose filter name was already taken (e.g. `foo.xlsx` next to `foo.csv`).
    pub skipped: Vec<PathBuf>,
}

/// Remote curve download. Disabled: always fails.
pub fn fetch_from_url(url: &str) -> Result<FilterCurve, LoadError> {
    log::warn!("Ignoring request to download {url}: remote curves are disabled");
    Err(LoadError::RemoteDisabled {
        url: url.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Naming helpers
// ---------------------------------------------------------------------------

/// Filter name: the file name up to its first `.`.
pub fn filter_name(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or_default();
    file.split('.').next().unwrap_or(file).to_string()
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub fn is_curve_file(path: &Path) -> bool {
    matches!(extension(path).as_str(), "csv" | "xlsx")
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Wavelength / transmission pairs in file order.
#[derive(Debug, Clone, PartialEq)]
struct RawCurve {
    wavelength: Vec<f64>,
    transmission: Vec<f64>,
}

impl RawCurve {
    /// nm → µm and percent → fraction, decided from the maxima alone.
    fn normalize_units(&mut self, path: &Path) {
        if max_of(&self.wavelength) > NM_THRESHOLD {
            log::debug!(
                "Wavelength data in {} appears to be in nm, converting to µm",
                path.display()
            );
            self.wavelength.iter_mut().for_each(|w| *w /= 1000.0);
        }
        if max_of(&self.transmission) > PERCENT_THRESHOLD {
            log::debug!(
                "Transmission data in {} appears to be in percent, converting to a fraction",
                path.display()
            );
            self.transmission.iter_mut().for_each(|t| *t /= 100.0);
        }
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

fn is_wavelength_header(header: &str) -> bool {
    normalize_header(header).contains("wave")
}

/// `transmission`, optionally followed by a unit annotation such as `(%)`.
fn is_transmission_header(header: &str) -> bool {
    let header = normalize_header(header);
    let base = header
        .strip_suffix(')')
        .and_then(|s| s.rfind('(').map(|i| s[..i].trim_end()))
        .unwrap_or(&header);
    base == "transmission"
}

fn read_columns(path: &Path) -> Result<RawCurve, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let missing = |kind| LoadError::ColumnNotFound {
        path: path.to_path_buf(),
        kind,
        headers: headers.clone(),
    };
    let w_idx = headers
        .iter()
        .position(|h| is_wavelength_header(h))
        .ok_or_else(|| missing(ColumnKind::Wavelength))?;
    let t_idx = headers
        .iter()
        .position(|h| is_transmission_header(h))
        .ok_or_else(|| missing(ColumnKind::Transmission))?;

    let mut raw = RawCurve {
        wavelength: Vec::new(),
        transmission: Vec::new(),
    };

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let w_cell = record.get(w_idx).unwrap_or("");
        let t_cell = record.get(t_idx).unwrap_or("");
        if w_cell.is_empty() && t_cell.is_empty() {
            continue;
        }

        let parse = |cell: &str, idx: usize| {
            cell.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
                path: path.to_path_buf(),
                row: i + 1,
                column: headers[idx].clone(),
                value: cell.to_string(),
            })
        };
        raw.wavelength.push(parse(w_cell, w_idx)?);
        // Sign is measurement noise, not information.
        raw.transmission.push(parse(t_cell, t_idx)?.abs());
    }

    Ok(raw)
}

// ---------------------------------------------------------------------------
// Spreadsheet conversion
// ---------------------------------------------------------------------------

/// Materialise the first worksheet of `xlsx` as a sibling `.csv` and return
/// its path. An existing sibling is reused untouched.
pub fn csv_from_xlsx(xlsx: &Path) -> Result<PathBuf, LoadError> {
    let csv_path = xlsx.with_extension("csv");
    if csv_path.exists() {
        log::debug!("{} exists", csv_path.display());
        return Ok(csv_path);
    }

    let sheet_err = |reason: String| LoadError::Spreadsheet {
        path: xlsx.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(xlsx).map_err(|e| sheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| sheet_err("workbook has no worksheets".to_string()))?
        .map_err(|e| sheet_err(e.to_string()))?;

    // Written under a temporary name so a failed conversion never leaves a
    // truncated `<stem>.csv` that later scans would pick up.
    let partial = xlsx.with_extension("csv.partial");
    if let Err(e) = write_rows(&partial, &range) {
        if partial.is_file() {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                log::warn!("Could not remove {}: {cleanup}", partial.display());
            }
        }
        return Err(e);
    }
    std::fs::rename(&partial, &csv_path).map_err(|source| LoadError::Io {
        path: csv_path.clone(),
        source,
    })?;

    log::info!("{} created from {}", csv_path.display(), xlsx.display());
    Ok(csv_path)
}

fn write_rows(path: &Path, range: &calamine::Range<calamine::Data>) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in range.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn loader() -> CurveLoader {
        let grid = WavelengthGrid::new(0.2, 1.0, 81).unwrap();
        CurveLoader::new(grid, DEFAULT_FALLBACK)
    }

    #[test]
    fn header_matching() {
        assert!(is_wavelength_header(" Wavelength(nm) "));
        assert!(is_wavelength_header("WAVE"));
        assert!(!is_wavelength_header("lambda"));

        assert!(is_transmission_header(" Transmission "));
        assert!(is_transmission_header("Transmission(%)"));
        assert!(is_transmission_header("transmission (%)"));
        assert!(!is_transmission_header("transmission_avg"));
        assert!(!is_transmission_header("T"));
    }

    #[test]
    fn filter_name_stops_at_first_dot() {
        assert_eq!(filter_name(Path::new("/tmp/bk7.window.csv")), "bk7");
        assert_eq!(filter_name(Path::new("longpass.xlsx")), "longpass");
    }

    #[test]
    fn round_trip_nm_and_percent() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "coating.csv",
            "Wavelength(nm),Transmission(%)\n400,20\n600,80\n800,50\n",
        );

        let spline = loader().interpolant(&path).unwrap();
        assert_eq!(spline.domain(), (0.4, 0.8));
        assert_relative_eq!(spline.evaluate(0.4), 0.2, epsilon = 1e-9);
        assert_relative_eq!(spline.evaluate(0.6), 0.8, epsilon = 1e-9);
        assert_relative_eq!(spline.evaluate(0.8), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn unit_fraction_data_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "window.csv",
            "wavelength,transmission\n0.3,0.5\n0.5,0.9\n0.9,1.0\n",
        );

        let spline = loader().interpolant(&path).unwrap();
        assert_eq!(spline.domain(), (0.3, 0.9));
        assert_relative_eq!(spline.evaluate(0.9), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn wavelength_unit_switches_strictly_above_100() {
        let dir = TempDir::new().unwrap();
        let at_limit = write(
            &dir,
            "at_limit.csv",
            "wavelength,transmission\n50,0.5\n100,0.5\n",
        );
        let above = write(
            &dir,
            "above.csv",
            "wavelength,transmission\n50,0.5\n100.5,0.5\n",
        );

        assert_eq!(loader().interpolant(&at_limit).unwrap().domain(), (50.0, 100.0));
        let (lo, hi) = loader().interpolant(&above).unwrap().domain();
        assert_relative_eq!(lo, 0.05, epsilon = 1e-12);
        assert_relative_eq!(hi, 0.1005, epsilon = 1e-12);
    }

    #[test]
    fn negative_transmission_is_taken_as_magnitude() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "noisy.csv",
            "wave,transmission\n0.3,-0.25\n0.5,0.5\n0.7,0.75\n",
        );

        let spline = loader().interpolant(&path).unwrap();
        assert_relative_eq!(spline.evaluate(0.3), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn grid_points_outside_data_get_fallback() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "narrow.csv",
            "wavelength,transmission\n0.5,0.9\n0.6,0.9\n0.7,0.9\n",
        );

        let curve = loader().load(&path).unwrap();
        assert_eq!(curve.name, "narrow");
        assert_eq!(curve.len(), 81);
        // Grid is 0.2..=1.0 in 0.01 steps.
        assert_eq!(curve.samples[0], DEFAULT_FALLBACK);
        assert_eq!(curve.samples[80], DEFAULT_FALLBACK);
        assert_relative_eq!(curve.samples[40], 0.9, epsilon = 1e-9);
        assert!(curve.samples.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn missing_columns_are_typed_errors() {
        let dir = TempDir::new().unwrap();
        let no_wave = write(&dir, "a.csv", "lambda,transmission\n1,1\n2,1\n");
        let no_trans = write(&dir, "b.csv", "wavelength,T\n1,1\n2,1\n");

        assert!(matches!(
            loader().load(&no_wave),
            Err(LoadError::ColumnNotFound {
                kind: ColumnKind::Wavelength,
                ..
            })
        ));
        assert!(matches!(
            loader().load(&no_trans),
            Err(LoadError::ColumnNotFound {
                kind: ColumnKind::Transmission,
                ..
            })
        ));
    }

    #[test]
    fn bad_cells_and_order_are_reported() {
        let dir = TempDir::new().unwrap();
        let bad_cell = write(&dir, "c.csv", "wavelength,transmission\n0.4,0.5\n0.5,abc\n");
        let unsorted = write(
            &dir,
            "d.csv",
            "wavelength,transmission\n0.6,0.5\n0.4,0.5\n0.5,0.5\n",
        );

        match loader().load(&bad_cell) {
            Err(LoadError::InvalidNumber { row, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            loader().load(&unsorted),
            Err(LoadError::Curve {
                source: SplineError::NotAscending(1),
                ..
            })
        ));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "gaps.csv",
            "wavelength,transmission\n0.4,0.5\n,\n0.6,0.5\n",
        );
        let spline = loader().interpolant(&path).unwrap();
        assert_eq!(spline.domain(), (0.4, 0.6));
    }

    #[test]
    fn unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.txt", "wavelength,transmission\n");
        assert!(matches!(
            loader().load(&path),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn scan_skips_bad_files_and_continues() {
        let dir = TempDir::new().unwrap();
        write(&dir, "good_a.csv", "wavelength,transmission\n0.2,0.5\n1.0,0.5\n");
        write(&dir, "broken.csv", "lambda,transmission\n0.2,0.5\n1.0,0.5\n");
        write(&dir, "good_b.CSV", "Wavelength,Transmission\n200,50\n1000,50\n");
        write(&dir, "readme.md", "not a curve");

        let report = loader().scan_directory(dir.path()).unwrap();
        assert_eq!(report.filters.names(), vec!["good_a", "good_b"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].0.ends_with("broken.csv"));
    }

    #[test]
    fn scan_prefers_existing_csv_over_spreadsheet() {
        let dir = TempDir::new().unwrap();
        write(&dir, "filter.csv", "wavelength,transmission\n0.2,0.5\n1.0,0.5\n");
        // Not a real workbook: it must never be opened.
        write(&dir, "filter.xlsx", "garbage");

        let report = loader().scan_directory(dir.path()).unwrap();
        assert_eq!(report.filters.len(), 1);
        assert!(report.failures.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn xlsx_conversion_reuses_existing_csv() {
        let dir = TempDir::new().unwrap();
        let xlsx = write(&dir, "coat.xlsx", "garbage");
        let original = "wavelength,transmission\n0.2,0.5\n1.0,0.5\n";
        let csv = write(&dir, "coat.csv", original);

        assert_eq!(csv_from_xlsx(&xlsx).unwrap(), csv);
        assert_eq!(fs::read_to_string(&csv).unwrap(), original);
    }

    fn write_workbook(path: &Path) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Wavelength(nm)").unwrap();
        sheet.write_string(0, 1, "Transmission(%)").unwrap();
        for (row, (w, t)) in [(400.0, 20.0), (600.0, 80.0), (800.0, 50.0)]
            .into_iter()
            .enumerate()
        {
            let row = row as u32 + 1;
            sheet.write_number(row, 0, w).unwrap();
            sheet.write_number(row, 1, t).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn xlsx_converts_first_sheet_and_loads() {
        let dir = TempDir::new().unwrap();
        let xlsx = dir.path().join("coat.xlsx");
        write_workbook(&xlsx);

        let csv = csv_from_xlsx(&xlsx).unwrap();
        assert_eq!(csv, dir.path().join("coat.csv"));
        assert_eq!(
            fs::read_to_string(&csv).unwrap(),
            "Wavelength(nm),Transmission(%)\n400,20\n600,80\n800,50\n"
        );
        assert!(!dir.path().join("coat.csv.partial").exists());

        let grid = WavelengthGrid::new(0.4, 0.8, 3).unwrap();
        let curve = CurveLoader::new(grid, DEFAULT_FALLBACK).load(&xlsx).unwrap();
        assert_eq!(curve.name, "coat");
        for (got, want) in curve.samples.iter().zip([0.2, 0.8, 0.5]) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn failed_conversion_leaves_no_csv_behind() {
        let dir = TempDir::new().unwrap();
        let xlsx = dir.path().join("coat.xlsx");
        write_workbook(&xlsx);
        // A directory in the temporary file's place makes the write fail.
        fs::create_dir(dir.path().join("coat.csv.partial")).unwrap();

        assert!(csv_from_xlsx(&xlsx).is_err());
        assert!(!dir.path().join("coat.csv").exists());
    }

    #[test]
    fn unreadable_workbook_is_an_error() {
        let dir = TempDir::new().unwrap();
        let xlsx = write(&dir, "broken.xlsx", "garbage");
        assert!(matches!(
            csv_from_xlsx(&xlsx),
            Err(LoadError::Spreadsheet { .. })
        ));
        assert!(!dir.path().join("broken.csv").exists());
    }

    #[test]
    fn remote_fetch_is_disabled() {
        assert!(matches!(
            fetch_from_url("https://example.com/filter.csv"),
            Err(LoadError::RemoteDisabled { .. })
        ));
    }
}
