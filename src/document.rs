use crate::error::{Error, Result};
use log::debug;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Picks the text to load from: the contents of `filename`, or `raw` verbatim.
/// Exactly one of the two must be given.
pub(crate) fn read_source<'a>(
    filename: Option<&Path>,
    raw: Option<&'a str>,
) -> Result<Cow<'a, str>> {
    match (filename, raw) {
        (Some(path), None) => read_file(path).map(Cow::Owned),
        (None, Some(raw)) => Ok(Cow::Borrowed(raw)),
        (Some(_), Some(_)) => Err(Error::Argument(
            "both `filename` and `raw` were supplied".to_string(),
        )),
        (None, None) => Err(Error::Argument(
            "neither `filename` nor `raw` was supplied".to_string(),
        )),
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    debug!("reading {}", path.display());
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `contents` to `path` in one piece.
///
/// The text goes to a temporary file next to `path` which is then renamed over it,
/// so a failure never leaves a truncated file behind.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    debug!("writing {} bytes to {}", contents.len(), path.display());
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
