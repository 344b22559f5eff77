use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Render a path as a command-line argument that can't be mistaken for a flag.
///
/// Paths starting with '-' get a "./" prefix; everything else passes through
/// untouched, non-UTF-8 bytes included.
pub fn safe_path_arg(path: &Path) -> Cow<'_, OsStr> {
    if path.as_os_str().to_string_lossy().starts_with('-') {
        let mut prefixed = OsString::from("./");
        prefixed.push(path.as_os_str());
        Cow::Owned(prefixed)
    } else {
        Cow::Borrowed(path.as_os_str())
    }
}
