//! Loading of resource configuration files.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

use vpc_eip::ElasticIpConfig;

/// Errors raised while reading a resource file.
#[derive(Debug, Error, Eq, PartialEq)]
pub(crate) enum InputError {
    /// The file could not be read.
    #[error("failed to read resource file {path}: {message}")]
    Read { path: String, message: String },
    /// The file is not a valid configuration record.
    #[error("invalid resource file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Reads and decodes an elastic IP configuration from `path`.
pub(crate) fn read_resource(path: &Utf8Path) -> Result<ElasticIpConfig, InputError> {
    let contents = read_to_string_ambient(path).map_err(|message| InputError::Read {
        path: path.to_string(),
        message,
    })?;
    serde_json::from_str(&contents).map_err(|err| InputError::Parse {
        path: path.to_string(),
        message: err.to_string(),
    })
}

fn read_to_string_ambient(path: &Utf8Path) -> Result<String, String> {
    let (dir_path, file_path) = if path.is_absolute() {
        let parent = path
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path}"))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}
