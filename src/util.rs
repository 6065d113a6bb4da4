use std::path::PathBuf;

/// Expands a leading `~` in a user-supplied path to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    let is_separator = |c: char| c == '/' || c == '\\';
    if !(rest.is_empty() || rest.starts_with(is_separator)) {
        // `~user` is not expanded
        return PathBuf::from(path);
    }
    match dirs::home_dir() {
        Some(home) if rest.trim_start_matches(is_separator).is_empty() => home,
        Some(home) => home.join(rest.trim_start_matches(is_separator)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/Downloads/apps"), home.join("Downloads/apps"));
        assert_eq!(expand_home("/tmp/out"), PathBuf::from("/tmp/out"));
        assert_eq!(expand_home("~bob/x"), PathBuf::from("~bob/x"));
    }
}
