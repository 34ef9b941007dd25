use std::fs::create_dir_all;
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;

use tracing::error;

use crate::Result;
use crate::SystemError;

/// Creates every missing directory above `path`.
pub fn create_parent_dir_if_not_exist(path: &Path) -> Result<()> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.exists() {
            if let Err(e) = create_dir_all(parent_dir) {
                error!("Failed to create directory {:?}: {:?}", parent_dir, e);
                return Err(SystemError::Io(e).into());
            }
        }
    }
    Ok(())
}

/// Opens `path` for appending, creating it and its parents as needed.
pub fn open_file_for_append(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    create_parent_dir_if_not_exist(path)?;
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(SystemError::Io)?;
    Ok(file)
}
