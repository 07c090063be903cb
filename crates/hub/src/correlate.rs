//! Source correlator — maps captured locations to local files.
//!
//! A captured location arrives in one of several encodings (file URI,
//! remote URL, absolute path, workspace-relative path). Resolution tries a
//! fixed cascade and the first candidate that exists on disk wins. Nothing
//! is cached; correlation volume is bounded by displayed events.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tracing::trace;
use url::Url;

/// Ordered prefix substitution; the first matching prefix wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub url_prefix: String,
    pub local_path_prefix: String,
}

pub struct SourceCorrelator {
    mappings: Vec<PathMapping>,
    roots: Vec<PathBuf>,
}

impl SourceCorrelator {
    pub fn new(mappings: Vec<PathMapping>, roots: Vec<PathBuf>) -> Self {
        Self { mappings, roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve a raw location to an existing local file, or `None`.
    pub fn resolve(&self, raw: &str) -> Option<PathBuf> {
        if raw.is_empty() {
            return None;
        }
        let resolved = self
            .try_file_uri(raw)
            .or_else(|| self.try_mappings(raw))
            .or_else(|| self.try_generic_url(raw))
            .or_else(|| self.try_absolute(raw))
            .or_else(|| self.try_relative(raw));
        if resolved.is_none() {
            trace!("unresolved location: {}", raw);
        }
        resolved
    }

    fn try_file_uri(&self, raw: &str) -> Option<PathBuf> {
        if !raw.starts_with("file:") {
            return None;
        }
        let url = Url::parse(raw).ok()?;
        let path = url.to_file_path().ok()?;
        path.exists().then_some(path)
    }

    /// Substitute the first matching prefix; the substituted path is
    /// taken as absolute or joined against the workspace roots. A match
    /// that resolves to nothing ends the mapping step (first match wins),
    /// falling through to the remaining cascade.
    fn try_mappings(&self, raw: &str) -> Option<PathBuf> {
        let mapping = self
            .mappings
            .iter()
            .find(|m| !m.url_prefix.is_empty() && raw.starts_with(&m.url_prefix))?;
        let rest = &raw[mapping.url_prefix.len()..];
        let candidate = format!("{}{}", mapping.local_path_prefix, rest);
        let path = Path::new(&candidate);
        if path.is_absolute() {
            path.exists().then(|| path.to_path_buf())
        } else {
            self.join_roots(path)
        }
    }

    /// A generic URL contributes only its decoded path component, joined
    /// against every workspace root with the leading separator trimmed.
    fn try_generic_url(&self, raw: &str) -> Option<PathBuf> {
        let url = Url::parse(raw).ok()?;
        if url.cannot_be_a_base() {
            return None;
        }
        let decoded = percent_decode_str(url.path()).decode_utf8().ok()?;
        let trimmed = decoded.trim_start_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        self.join_roots(Path::new(trimmed))
    }

    fn try_absolute(&self, raw: &str) -> Option<PathBuf> {
        let path = Path::new(raw);
        (path.is_absolute() && path.exists()).then(|| path.to_path_buf())
    }

    fn try_relative(&self, raw: &str) -> Option<PathBuf> {
        let path = Path::new(raw);
        if path.is_absolute() {
            return None;
        }
        self.join_roots(path)
    }

    fn join_roots(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A workspace root containing `src/app.js` and `deep path/üni.js`.
    fn workspace() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/app.js"), "x").unwrap();
        fs::create_dir_all(dir.path().join("deep path")).unwrap();
        fs::write(dir.path().join("deep path/üni.js"), "x").unwrap();
        dir
    }

    fn correlator(root: &TempDir, mappings: Vec<PathMapping>) -> SourceCorrelator {
        SourceCorrelator::new(mappings, vec![root.path().to_path_buf()])
    }

    #[test]
    fn absolute_existing_path_resolves() {
        let root = workspace();
        let absolute = root.path().join("src/app.js");
        let resolver = correlator(&root, vec![]);
        assert_eq!(
            resolver.resolve(absolute.to_str().unwrap()),
            Some(absolute)
        );
    }

    #[test]
    fn relative_path_joins_workspace_roots() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(
            resolver.resolve("src/app.js"),
            Some(root.path().join("src/app.js"))
        );
    }

    #[test]
    fn missing_relative_path_is_unresolved() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(resolver.resolve("src/missing.js"), None);
    }

    #[test]
    fn file_uri_decodes_and_resolves() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        let target = root.path().join("deep path/üni.js");
        let uri = Url::from_file_path(&target).unwrap().to_string();
        assert!(uri.contains("%20"), "sanity: space must be encoded: {}", uri);
        assert_eq!(resolver.resolve(&uri), Some(target));
    }

    #[test]
    fn file_uri_to_missing_file_is_unresolved_even_if_relative_would_match() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(resolver.resolve("file:///definitely/not/here.js"), None);
    }

    #[test]
    fn mapping_prefix_substitutes_to_relative_candidate() {
        let root = workspace();
        let resolver = correlator(
            &root,
            vec![PathMapping {
                url_prefix: "webpack://app/".to_string(),
                local_path_prefix: "".to_string(),
            }],
        );
        assert_eq!(
            resolver.resolve("webpack://app/src/app.js"),
            Some(root.path().join("src/app.js"))
        );
    }

    #[test]
    fn mapping_prefix_substitutes_to_absolute_candidate() {
        let root = workspace();
        let resolver = correlator(
            &root,
            vec![PathMapping {
                url_prefix: "https://cdn.example/".to_string(),
                local_path_prefix: format!("{}/", root.path().display()),
            }],
        );
        assert_eq!(
            resolver.resolve("https://cdn.example/src/app.js"),
            Some(root.path().join("src/app.js"))
        );
    }

    #[test]
    fn first_matching_mapping_wins() {
        let root = workspace();
        let resolver = correlator(
            &root,
            vec![
                PathMapping {
                    url_prefix: "bundle:".to_string(),
                    local_path_prefix: "nowhere/".to_string(),
                },
                PathMapping {
                    url_prefix: "bundle:src".to_string(),
                    local_path_prefix: "src".to_string(),
                },
            ],
        );
        // the first (broader) prefix matches and its candidate does not
        // exist; the second mapping, which would have resolved, must not
        // be consulted (and `bundle:` is not a base URL, so the generic
        // URL step contributes nothing either)
        assert_eq!(resolver.resolve("bundle:src/app.js"), None);
    }

    #[test]
    fn unmatched_url_falls_through_to_generic_url_step() {
        let root = workspace();
        let resolver = correlator(
            &root,
            vec![PathMapping {
                url_prefix: "webpack://app/".to_string(),
                local_path_prefix: "nowhere/".to_string(),
            }],
        );
        // no mapping prefix matches, but the URL's path joined against
        // the workspace root does exist
        assert_eq!(
            resolver.resolve("webpack://other/src/app.js"),
            Some(root.path().join("src/app.js"))
        );
    }

    #[test]
    fn generic_url_path_joins_roots() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(
            resolver.resolve("http://localhost:3000/src/app.js"),
            Some(root.path().join("src/app.js"))
        );
    }

    #[test]
    fn generic_url_ignores_query_and_fragment() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(
            resolver.resolve("http://localhost:3000/src/app.js?v=123#L10"),
            Some(root.path().join("src/app.js"))
        );
    }

    #[test]
    fn generic_url_decodes_percent_escapes() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(
            resolver.resolve("http://localhost:3000/deep%20path/%C3%BCni.js"),
            Some(root.path().join("deep path/üni.js"))
        );
    }

    #[test]
    fn unresolvable_inputs_return_none() {
        let root = workspace();
        let resolver = correlator(&root, vec![]);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("no/such/file.js"), None);
        assert_eq!(resolver.resolve("http://localhost/no/such.js"), None);
        assert_eq!(resolver.resolve("data:text/plain,hello"), None);
    }

    #[test]
    fn multiple_roots_first_existing_wins() {
        let empty = tempfile::tempdir().unwrap();
        let root = workspace();
        let resolver = SourceCorrelator::new(
            vec![],
            vec![empty.path().to_path_buf(), root.path().to_path_buf()],
        );
        assert_eq!(
            resolver.resolve("src/app.js"),
            Some(root.path().join("src/app.js"))
        );
    }
}
