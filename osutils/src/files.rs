use std::{
    fs::{File, Permissions},
    os::unix::fs::PermissionsExt,
    path::Path,
};

use anyhow::{Context, Error};

/// Creates a file and all parent directories if they don't exist
pub fn create_file<S>(path: S) -> Result<File, Error>
where
    S: AsRef<Path>,
{
    if let Some(parent) = path.as_ref().parent() {
        create_dirs(parent)?;
    }

    std::fs::File::create(path.as_ref()).context(format!(
        "Could not create file: {}",
        path.as_ref().display()
    ))
}

/// Creates all directories in a path if they don't exist
pub fn create_dirs<S>(path: S) -> Result<(), Error>
where
    S: AsRef<Path>,
{
    // An empty parent means the current directory.
    if path.as_ref().as_os_str().is_empty() {
        return Ok(());
    }

    std::fs::create_dir_all(path.as_ref()).context(format!(
        "Could not create path: {}",
        path.as_ref().display()
    ))
}

/// Writes `contents` to `path`, creating parent directories, and sets the file mode
pub fn write_file_mode<S>(path: S, contents: &str, mode: u32) -> Result<(), Error>
where
    S: AsRef<Path>,
{
    if let Some(parent) = path.as_ref().parent() {
        create_dirs(parent)?;
    }

    std::fs::write(path.as_ref(), contents).context(format!(
        "Could not write file: {}",
        path.as_ref().display()
    ))?;
    std::fs::set_permissions(path.as_ref(), Permissions::from_mode(mode)).context(format!(
        "Could not set permissions {:#o} for file {}",
        mode,
        path.as_ref().display()
    ))
}

/// Decodes captured process output, dropping NUL bytes and replacing invalid UTF-8
pub fn decode_captured(bytes: &[u8]) -> String {
    let cleaned: Vec<u8> = bytes.iter().copied().filter(|b| *b != 0).collect();
    String::from_utf8_lossy(&cleaned).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        create_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_create_dirs_empty_path() {
        create_dirs("").unwrap();
    }

    #[test]
    fn test_write_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin/run");
        write_file_mode(&path, "#!/bin/sh\n", 0o755).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        write_file_mode(&path, "data", 0o644).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }

    #[test]
    fn test_decode_captured() {
        assert_eq!(decode_captured(b"a\0b\0\0c\n"), "abc\n");
        assert_eq!(decode_captured(b"ok \xff"), "ok \u{fffd}");
    }
}
