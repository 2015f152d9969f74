use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{Cli, Config};

const PROMPT_ATTEMPTS: usize = 5;

// ---------------------------------------------------------------------------
// Working directory resolution
// ---------------------------------------------------------------------------

/// Pick the directory holding the curve files and switch the process into it.
///
/// Order: `--dir`, then the console prompt (`--prompt`) or the native folder
/// picker, then `<cwd>/<default_subdir>`.
pub fn resolve(cli: &Cli, config: &Config) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let fallback = cwd.join(&config.default_subdir);

    let chosen = match cli.dir.as_deref() {
        Some(dir) if dir.is_dir() => Some(dir.to_path_buf()),
        Some(dir) => {
            log::warn!("{} is not a directory", dir.display());
            None
        }
        None => None,
    };
    let chosen = chosen.or_else(|| {
        if cli.prompt {
            let stdin = io::stdin();
            prompt_for_directory(&mut stdin.lock(), &mut io::stdout(), PROMPT_ATTEMPTS)
        } else {
            pick_folder(&cwd)
        }
    });

    let directory = match chosen {
        Some(dir) => dir,
        None if fallback.is_dir() => {
            log::info!("Nothing selected, using default {}", fallback.display());
            fallback
        }
        None => {
            log::warn!(
                "Nothing selected and {} does not exist, staying in {}",
                fallback.display(),
                cwd.display()
            );
            cwd
        }
    };

    log::info!("Switching to {}", directory.display());
    std::env::set_current_dir(&directory)
        .with_context(|| format!("changing directory to {}", directory.display()))?;
    Ok(directory)
}

fn pick_folder(start: &Path) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select the transmission curve folder")
        .set_directory(start)
        .pick_folder()
}

/// Ask until an existing directory is entered, at most `attempts` times.
pub fn prompt_for_directory<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    attempts: usize,
) -> Option<PathBuf> {
    for _ in 0..attempts {
        // Prompt output is best effort; a closed stdout should not stop the read.
        let _ = write!(output, "Enter the directory of the filter curve files: ");
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        let candidate = PathBuf::from(line.trim());
        if candidate.is_dir() {
            return Some(candidate);
        }
        log::warn!("'{}' is not a directory", candidate.display());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn prompt_accepts_first_existing_directory() {
        let dir = TempDir::new().unwrap();
        let answers = format!("/definitely/not/here\n{}\n", dir.path().display());
        let mut out = Vec::new();

        let picked = prompt_for_directory(&mut Cursor::new(answers), &mut out, 5);
        assert_eq!(picked.as_deref(), Some(dir.path()));
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Enter the directory").count(), 2);
    }

    #[test]
    fn prompt_gives_up_after_attempts() {
        let answers = "nope\nnope\nnope\nfound-too-late\n";
        let picked = prompt_for_directory(&mut Cursor::new(answers), &mut Vec::new(), 3);
        assert!(picked.is_none());
    }

    #[test]
    fn prompt_stops_at_end_of_input() {
        let picked = prompt_for_directory(&mut Cursor::new(""), &mut Vec::new(), 5);
        assert!(picked.is_none());
    }
}
