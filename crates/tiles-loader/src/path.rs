//! Tile path normalization.

use url::Url;

use crate::error::{LoaderError, LoaderResult};

/// Base every tile path is resolved against before its path component is
/// extracted. Nothing is ever fetched from it.
pub const SYNTHETIC_BASE: &str = "http://tile.localhost/";

/// Normalize a tile-supplied path to its canonical path component.
///
/// Relative paths are taken from the root, dot segments are collapsed, and
/// query strings and fragments are dropped. An absolute URL contributes only
/// its path, so a tile cannot steer resolution towards another origin.
///
/// # Errors
///
/// Returns [`LoaderError::InvalidPath`] if the input cannot be parsed as a
/// URL reference.
pub fn canonical_path(path: &str) -> LoaderResult<String> {
    let base = Url::parse(SYNTHETIC_BASE).map_err(|e| invalid(SYNTHETIC_BASE, &e))?;
    let resolved = base.join(path).map_err(|e| invalid(path, &e))?;
    Ok(resolved.path().to_string())
}

fn invalid(path: &str, err: &url::ParseError) -> LoaderError {
    LoaderError::InvalidPath {
        path: path.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths() {
        assert_eq!(canonical_path("/icon.png").unwrap(), "/icon.png");
        assert_eq!(canonical_path("icon.png").unwrap(), "/icon.png");
        assert_eq!(canonical_path("").unwrap(), "/");
    }

    #[test]
    fn test_dot_segments_cannot_climb_above_root() {
        assert_eq!(canonical_path("/a/../../etc/passwd").unwrap(), "/etc/passwd");
        assert_eq!(canonical_path("./a/./b").unwrap(), "/a/b");
    }

    #[test]
    fn test_query_and_fragment_are_dropped() {
        assert_eq!(canonical_path("/app.js?v=3#main").unwrap(), "/app.js");
    }

    #[test]
    fn test_absolute_url_keeps_only_path() {
        assert_eq!(
            canonical_path("https://evil.example/steal.js").unwrap(),
            "/steal.js"
        );
    }

    #[test]
    fn test_spaces_are_percent_encoded() {
        assert_eq!(canonical_path("/my file.txt").unwrap(), "/my%20file.txt");
    }
}
