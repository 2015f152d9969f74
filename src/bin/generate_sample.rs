//! Writes a handful of demo filter curves (mixed nm/µm and percent/fraction
//! units) into the default curve folder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(about = "Generate demo transmission curves")]
struct Args {
    /// Output folder.
    #[arg(default_value = "ExampleCSVs")]
    out: PathBuf,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Smooth step from 0 to 1 centred on `edge`.
fn logistic(x: f64, edge: f64, width: f64) -> f64 {
    1.0 / (1.0 + (-(x - edge) / width).exp())
}

/// Dark-signal offset subtracted from the long-pass curve, in percent.
const DETECTOR_OFFSET: f64 = 0.2;

/// Long-pass edge at 500 nm, nm / percent. The detector offset pushes the
/// blocked region slightly negative; the loader keeps the magnitude.
fn longpass() -> Vec<(f64, f64)> {
    (0..=160)
        .map(|i| 200.0 + i as f64 * 5.0)
        .map(|w| (w, 95.0 * logistic(w, 500.0, 8.0) - DETECTOR_OFFSET))
        .collect()
}

fn write_curve(path: &Path, headers: [&str; 2], rows: &[(f64, f64)]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(headers)?;
    for (w, t) in rows {
        writer.write_record([format!("{w:.4}"), format!("{t:.6}")])?;
    }
    writer.flush()?;
    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    write_curve(
        &args.out.join("longpass_500.csv"),
        ["Wavelength(nm)", "Transmission(%)"],
        &longpass(),
    )?;

    // Short-pass edge at 0.8 µm, µm / fraction.
    let um: Vec<f64> = (0..=80).map(|i| 0.2 + i as f64 * 0.01).collect();
    let shortpass: Vec<(f64, f64)> = um
        .iter()
        .map(|&w| (w, 0.92 * (1.0 - logistic(w, 0.8, 0.01))))
        .collect();
    write_curve(
        &args.out.join("shortpass_800.csv"),
        ["wavelength", "transmission"],
        &shortpass,
    )?;

    // 650 nm band-pass covering only part of the grid, nm / fraction.
    let band: Vec<(f64, f64)> = (0..=60)
        .map(|i| 550.0 + i as f64 * 3.0)
        .map(|w| (w, gaussian(w, 650.0, 20.0, 0.85)))
        .collect();
    write_curve(
        &args.out.join("bandpass_650.csv"),
        [" Wave (nm) ", " Transmission "],
        &band,
    )?;

    // Neutral density, flat 10 %.
    let nd: Vec<(f64, f64)> = um.iter().map(|&w| (w, 0.1)).collect();
    write_curve(&args.out.join("nd_10.csv"), ["wavelength_um", "Transmission"], &nd)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longpass_is_reproducible_and_dips_below_zero() {
        let rows = longpass();
        assert_eq!(rows, longpass());
        assert_eq!(rows.len(), 161);
        assert!(rows[0].1 < 0.0);
        assert!(rows[160].1 > 94.0);
        assert!(rows.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
