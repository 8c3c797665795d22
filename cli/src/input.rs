//! Input sources read one after another as a single line stream.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";

/// Reads lines from each input in order, opening files lazily.
///
/// With no paths, standard input is read. A line never spans two inputs.
pub struct InputChain {
    pending: VecDeque<PathBuf>,
    current: Option<Box<dyn BufRead>>,
}

impl InputChain {
    /// Creates a chain over the given paths.
    pub fn new(paths: &[PathBuf]) -> Self {
        let pending = if paths.is_empty() {
            VecDeque::from([PathBuf::from(STDIN_PATH)])
        } else {
            paths.iter().cloned().collect()
        };

        Self {
            pending,
            current: None,
        }
    }

    /// Appends the next line, including its `\n` if present, to `buf`.
    ///
    /// Returns the number of bytes read; zero means every input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if an input cannot be opened or read.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        loop {
            if self.current.is_none() {
                let Some(path) = self.pending.pop_front() else {
                    return Ok(0);
                };
                self.current = Some(open(&path)?);
            }

            if let Some(reader) = self.current.as_mut() {
                let read = reader
                    .read_until(b'\n', buf)
                    .context("failed to read input")?;
                if read > 0 {
                    return Ok(read);
                }
            }
            self.current = None;
        }
    }
}

fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == STDIN_PATH {
        tracing::debug!("reading standard input");
        return Ok(Box::new(io::stdin().lock()));
    }

    tracing::debug!(path = %path.display(), "opening input file");
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
