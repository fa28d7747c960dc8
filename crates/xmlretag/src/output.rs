//! Output paths and atomic file writes

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tempfile::{NamedTempFile, PersistError};
use tracing::debug;

use crate::error::{Error, Result};

/// Inserted between the file stem and the extension of the input name
pub const SUFFIX: &str = "_modified";

/// What to do when the output file already exists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "kebab-case"))]
pub enum OverwritePolicy {
    /// Replace the existing file
    #[default]
    Overwrite,
    /// Fail with [`ErrorKind::OutputExists`](crate::ErrorKind::OutputExists)
    Reject,
    /// Pick the first free `<stem>_modified_<n>.<ext>` name
    Version,
}

/// `dir/name.xml` becomes `dir/name_modified.xml`
///
/// The suffix goes before the last extension; names without one get it
/// appended.
pub fn output_path_for(input: &Path) -> PathBuf {
    suffixed(input, SUFFIX)
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let Some(stem) = path.file_stem() else {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        return PathBuf::from(name);
    };

    let mut name = OsString::from(stem);
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Write `contents` to `target` through a temporary file in the same directory
///
/// Returns the path actually written, which differs from `target` only under
/// [`OverwritePolicy::Version`].
pub(crate) fn write_atomic(target: &Path, contents: &[u8], policy: OverwritePolicy) -> Result<PathBuf> {
    let replaces = policy == OverwritePolicy::Overwrite;
    let mut file = temp_file_for(target, replaces).map_err(|err| Error::write(target, &err))?;
    file.write_all(contents)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|err| Error::write(target, &err))?;

    match policy {
        OverwritePolicy::Overwrite => {
            file.persist(target)
                .map_err(|err| Error::write(target, &err.error))?;
            Ok(target.to_path_buf())
        }
        OverwritePolicy::Reject => {
            file.persist_noclobber(target)
                .map_err(|err| Error::write(target, &err.error))?;
            Ok(target.to_path_buf())
        }
        OverwritePolicy::Version => persist_versioned(file, target),
    }
}

fn persist_versioned(mut file: NamedTempFile, target: &Path) -> Result<PathBuf> {
    let mut candidate = target.to_path_buf();
    let mut version = 0u32;

    loop {
        match file.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(PersistError { error, file: returned }) if error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "output exists, trying next version");
                file = returned;
                version = version.checked_add(1).ok_or_else(|| Error::write(target, &error))?;
                candidate = suffixed(target, &format!("_{version}"));
            }
            Err(err) => return Err(Error::write(&candidate, &err.error)),
        }
    }
}

/// A temporary file next to `target` with the mode the output should end up with
///
/// New outputs get the usual `0o666` less the umask. When `replaces` is set and
/// `target` already exists, its permissions are carried over instead.
fn temp_file_for(target: &Path, replaces: bool) -> io::Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".xmlretag-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let file = builder.tempfile_in(dir)?;

    if replaces {
        match fs::metadata(target) {
            Ok(existing) if existing.is_file() => {
                file.as_file().set_permissions(existing.permissions())?;
            }
            _ => {}
        }
    }

    Ok(file)
}
