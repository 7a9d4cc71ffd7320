//! Input sources for the folders.
//!
//! Inputs are streamed line by line so peak memory follows the number of
//! unique stacks, not the raw sample count.

use crate::utils::error::AnalysisError;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Path that selects standard input
pub const STDIN_PATH: &str = "-";

/// Open a file (or stdin for `-`) as a buffered reader
///
/// # Errors
/// * `AnalysisError::SourceUnavailable` - The file cannot be opened
pub fn open_source(path: &Path) -> Result<Box<dyn BufRead>, AnalysisError> {
    if path.as_os_str() == STDIN_PATH {
        debug!("Reading input from stdin");
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    debug!("Reading input from: {}", path.display());
    let file = File::open(path).map_err(|e| unavailable(path, e))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Feed every line of `reader` to `f`, without the line terminator
///
/// Invalid UTF-8 is replaced rather than rejected; profiler output often
/// carries mangled names from stripped binaries.
pub fn for_each_line<R, F>(mut reader: R, source: &Path, mut f: F) -> Result<(), AnalysisError>
where
    R: BufRead,
    F: FnMut(&str),
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| unavailable(source, e))?;
        if n == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        f(line.trim_end_matches(['\n', '\r']));
    }
}

fn unavailable(path: &Path, source: io::Error) -> AnalysisError {
    AnalysisError::SourceUnavailable {
        path: PathBuf::from(path),
        source,
    }
}
