// ── User directories and locale ───────────────────────────────────────────────

use std::path::PathBuf;

/// Well-known user directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemDir {
    Desktop,
    Documents,
    Downloads,
    Movies,
    Music,
    Pictures,
}

/// Resolve a user directory, `None` when the platform does not define it.
pub fn system_dir(dir: SystemDir) -> Option<PathBuf> {
    match dir {
        SystemDir::Desktop => dirs::desktop_dir(),
        SystemDir::Documents => dirs::document_dir(),
        SystemDir::Downloads => dirs::download_dir(),
        SystemDir::Movies => dirs::video_dir(),
        SystemDir::Music => dirs::audio_dir(),
        SystemDir::Pictures => dirs::picture_dir(),
    }
}

/// Per-user configuration directory, falling back to the working directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Per-user data directory, falling back to the configuration directory.
pub fn data_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(config_path)
}

/// Per-user cache directory, falling back to the configuration directory.
pub fn cache_path() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(config_path)
}

/// Preferred language, e.g. `"en_US"`.  Defaults to `"en"`.
pub fn locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .find_map(|var| std::env::var(var).ok().and_then(|v| parse_locale(&v)))
        .unwrap_or_else(|| "en".to_owned())
}

/// Strip encoding and modifier suffixes: `de_DE.UTF-8@euro` → `de_DE`.
fn parse_locale(value: &str) -> Option<String> {
    let tag = value.split(['.', '@']).next()?.trim();
    match tag {
        "" | "C" | "POSIX" => None,
        _ => Some(tag.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_suffixes_are_stripped() {
        assert_eq!(parse_locale("de_DE.UTF-8@euro").as_deref(), Some("de_DE"));
        assert_eq!(parse_locale("fr_CA").as_deref(), Some("fr_CA"));
    }

    #[test]
    fn posix_locales_are_ignored() {
        assert_eq!(parse_locale("C.UTF-8"), None);
        assert_eq!(parse_locale("POSIX"), None);
        assert_eq!(parse_locale(""), None);
    }

    #[test]
    fn fallback_paths_are_never_empty() {
        assert!(!config_path().as_os_str().is_empty());
        assert!(!data_path().as_os_str().is_empty());
        assert!(!cache_path().as_os_str().is_empty());
    }
}
