// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Resolves bundle-relative paths found inside agent specs against the bundle
//! root. A spec must never reach outside its bundle, so absolute paths and
//! `..` components are rejected rather than normalised away.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Bundle boundary enforcement for spec-referenced files

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path outside bundle boundary: {0}")]
    OutsideBoundary(String),

    #[error("Path too long: {0}")]
    PathTooLong(String),
}

/// A path proven to live under the bundle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePath {
    /// `root` joined with the normalised relative path.
    pub absolute: PathBuf,
    /// Normalised, `/`-separated, bundle-relative form.
    pub relative: String,
}

pub struct PathSanitizer {
    max_path_len: usize,
}

impl PathSanitizer {
    pub fn new() -> Self {
        Self { max_path_len: 4096 }
    }

    pub fn with_max_length(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    /// Resolve `relative` under `root`.
    ///
    /// # Examples
    /// ```
    /// use aether_core::domain::path_sanitizer::PathSanitizer;
    /// use std::path::Path;
    ///
    /// let sanitizer = PathSanitizer::new();
    /// let resolved = sanitizer
    ///     .resolve(Path::new("/bundles/research"), "prompts/./search/a.md")
    ///     .unwrap();
    /// assert_eq!(resolved.relative, "prompts/search/a.md");
    ///
    /// assert!(sanitizer.resolve(Path::new("/bundles/research"), "../secrets.md").is_err());
    /// ```
    pub fn resolve(&self, root: &Path, relative: &str) -> Result<BundlePath, PathSanitizerError> {
        self.validate(relative)?;

        let mut normalized = PathBuf::new();
        let mut segments = Vec::new();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    normalized.push(part);
                    segments.push(part.to_string_lossy().into_owned());
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(PathSanitizerError::PathTraversal(relative.to_string()));
                }
                Component::Prefix(_) | Component::RootDir => {
                    tracing::warn!(path = %relative, "Absolute path referenced from bundle spec");
                    return Err(PathSanitizerError::OutsideBoundary(relative.to_string()));
                }
            }
        }

        if segments.is_empty() {
            return Err(PathSanitizerError::InvalidPath(format!(
                "'{}' does not name a file",
                relative
            )));
        }

        Ok(BundlePath {
            absolute: root.join(normalized),
            relative: segments.join("/"),
        })
    }

    /// Lightweight checks before component parsing.
    pub fn validate(&self, path: &str) -> Result<(), PathSanitizerError> {
        if path.len() > self.max_path_len {
            return Err(PathSanitizerError::PathTooLong(path.to_string()));
        }

        if path.contains('\0') {
            tracing::warn!(path = %path, "Path contains null byte");
            return Err(PathSanitizerError::InvalidPath(
                "Path contains null byte".to_string(),
            ));
        }

        if path.trim().is_empty() {
            return Err(PathSanitizerError::InvalidPath("empty path".to_string()));
        }

        Ok(())
    }

    /// `path` relative to `root`, `/`-separated.
    pub fn strip_root(&self, path: &Path, root: &Path) -> Result<String, PathSanitizerError> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| PathSanitizerError::OutsideBoundary(path.display().to_string()))?;
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

impl Default for PathSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer
            .resolve(Path::new("/bundle"), "prompts/search/scholar_primary.md")
            .unwrap();
        assert_eq!(
            result.absolute,
            PathBuf::from("/bundle/prompts/search/scholar_primary.md")
        );
        assert_eq!(result.relative, "prompts/search/scholar_primary.md");
    }

    #[test]
    fn test_reject_parent_dir() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve(Path::new("/bundle"), "prompts/../../etc/passwd");
        assert!(matches!(result, Err(PathSanitizerError::PathTraversal(_))));
    }

    #[test]
    fn test_reject_absolute() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.resolve(Path::new("/bundle"), "/etc/passwd");
        assert!(matches!(result, Err(PathSanitizerError::OutsideBoundary(_))));
    }

    #[test]
    fn test_reject_empty_and_null() {
        let sanitizer = PathSanitizer::new();
        assert!(sanitizer.resolve(Path::new("/bundle"), "").is_err());
        assert!(sanitizer.resolve(Path::new("/bundle"), "./").is_err());
        assert!(sanitizer.validate("prompts\0/a.md").is_err());
    }

    #[test]
    fn test_path_too_long() {
        let sanitizer = PathSanitizer::with_max_length(10);
        let result = sanitizer.resolve(Path::new("/bundle"), "prompts/search/long.md");
        assert!(matches!(result, Err(PathSanitizerError::PathTooLong(_))));
    }

    #[test]
    fn test_strip_root() {
        let sanitizer = PathSanitizer::new();
        assert_eq!(
            sanitizer
                .strip_root(Path::new("/bundle/outputs/a.md"), Path::new("/bundle"))
                .unwrap(),
            "outputs/a.md"
        );
        assert!(sanitizer
            .strip_root(Path::new("/elsewhere/a.md"), Path::new("/bundle"))
            .is_err());
    }
}
