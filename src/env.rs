use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

const FALLBACK_SYSTEM_DRIVE: &str = "C:";

/// Whether the default install location can be resolved on this OS.
pub fn host_platform_supported() -> bool {
    env::consts::OS == "windows"
}

/// Machine-wide application data folder (`%ProgramData%` on Windows).
pub fn program_data_dir() -> PathBuf {
    resolve_program_data(env::var_os("ProgramData"), env::var_os("SystemDrive"))
}

/// Root the host application loads plugins from.
pub fn default_install_root() -> PathBuf {
    program_data_dir().join("Autodesk").join("Revit")
}

fn resolve_program_data(program_data: Option<OsString>, system_drive: Option<OsString>) -> PathBuf {
    if let Some(dir) = program_data.filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }
    let drive = system_drive
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| OsString::from(FALLBACK_SYSTEM_DRIVE));
    // `C:` joined with a relative component would be drive-relative on Windows.
    let mut root = drive;
    root.push("/");
    PathBuf::from(root).join("ProgramData")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_program_data_variable() {
        let dir = resolve_program_data(Some("D:/Data".into()), Some("C:".into()));
        assert_eq!(dir, PathBuf::from("D:/Data"));
    }

    #[test]
    fn falls_back_to_system_drive() {
        let dir = resolve_program_data(None, Some("E:".into()));
        assert_eq!(dir, PathBuf::from("E:/").join("ProgramData"));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let dir = resolve_program_data(Some("".into()), Some("".into()));
        assert_eq!(dir, PathBuf::from("C:/").join("ProgramData"));
    }
}
