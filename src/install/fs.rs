use std::fs;
use std::io;
use std::path::Path;

/// Filesystem operations the installer needs. Lets tests observe every write.
pub trait FileSystem {
    fn is_dir(&self, path: &Path) -> bool;

    /// Read a whole file, `Ok(None)` when nothing exists at `path`.
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replace the contents of `path`, applying `mode` where the platform has one.
    fn write(&self, path: &Path, bytes: &[u8], mode: u32) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
        fs::write(path, bytes)?;
        set_mode(path, mode)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

#[cfg(not(target_os = "windows"))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(target_os = "windows")]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
