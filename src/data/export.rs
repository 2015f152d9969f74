use std::path::{Path, PathBuf};

use thiserror::Error;

use super::grid::WavelengthGrid;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("{} already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("'{0}' is not a usable file name")]
    InvalidName(String),

    #[error("curve has {curve} samples but the grid has {grid}")]
    LengthMismatch { curve: usize, grid: usize },

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
}

/// `<dir>/<name>.csv`, or `InvalidName` if `name` cannot be a file name.
pub fn csv_path(dir: &Path, name: &str) -> Result<PathBuf, SaveError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
    {
        return Err(SaveError::InvalidName(name.to_string()));
    }
    Ok(dir.join(format!("{trimmed}.csv")))
}

/// Write `wavelength,transmission` rows for every grid point.
///
/// Refuses to overwrite: an existing file is left untouched and reported as
/// [`SaveError::AlreadyExists`].
pub fn save_curve(
    dir: &Path,
    name: &str,
    grid: &WavelengthGrid,
    curve: &[f64],
) -> Result<PathBuf, SaveError> {
    if curve.len() != grid.len() {
        return Err(SaveError::LengthMismatch {
            curve: curve.len(),
            grid: grid.len(),
        });
    }

    let path = csv_path(dir, name)?;
    log::debug!("Checking for {}", path.display());

    // `create_new` makes the existence check and the create one step.
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::AlreadyExists => SaveError::AlreadyExists { path: path.clone() },
            _ => SaveError::Io {
                path: path.clone(),
                source,
            },
        })?;

    let csv_err = |source| SaveError::Csv {
        path: path.clone(),
        source,
    };
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(["wavelength", "transmission"])
        .map_err(csv_err)?;
    for (w, t) in grid.points().iter().zip(curve) {
        writer
            .write_record([w.to_string(), t.to_string()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| SaveError::Io {
        path: path.clone(),
        source,
    })?;

    log::info!("Saved {} points to {}", curve.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn writes_header_and_one_row_per_point() {
        let dir = TempDir::new().unwrap();
        let grid = WavelengthGrid::new(0.2, 1.0, 5).unwrap();
        let curve = vec![1.0, 0.5, 0.25, 0.125, 1e-4];

        let path = save_curve(dir.path(), "my stack", &grid, &curve).unwrap();
        assert_eq!(path, dir.path().join("my stack.csv"));

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "wavelength,transmission");
        assert_eq!(lines.len(), 1 + grid.len());
        assert_eq!(lines[2], "0.4,0.5");
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let grid = WavelengthGrid::new(0.2, 1.0, 3).unwrap();
        let existing = dir.path().join("stack 0.csv");
        fs::write(&existing, "keep me").unwrap();

        let err = save_curve(dir.path(), "stack 0", &grid, &[1.0; 3]).unwrap_err();
        assert!(matches!(err, SaveError::AlreadyExists { .. }));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
    }

    #[test]
    fn rejects_unusable_names() {
        let dir = TempDir::new().unwrap();
        let grid = WavelengthGrid::new(0.2, 1.0, 3).unwrap();
        for name in ["", "   ", "..", "a/b"] {
            assert!(matches!(
                save_curve(dir.path(), name, &grid, &[1.0; 3]),
                Err(SaveError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn rejects_curve_of_wrong_length() {
        let dir = TempDir::new().unwrap();
        let grid = WavelengthGrid::new(0.2, 1.0, 3).unwrap();
        assert!(matches!(
            save_curve(dir.path(), "short", &grid, &[1.0; 2]),
            Err(SaveError::LengthMismatch { curve: 2, grid: 3 })
        ));
    }
}
