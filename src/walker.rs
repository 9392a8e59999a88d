//! # Walker Module
//!
//! Discovery ricorsiva delle immagini nella directory di input.
//!
//! ## Responsabilità:
//! - Traversata depth-first pre-order con `walkdir`, ordinata per nome
//! - Applica il `PathMatcher` a ogni entry: file esclusi saltati,
//!   directory escluse potate senza discendere
//! - Filtra i file regolari per estensione (case-insensitive)
//! - Produce le immagini in modo lazy, una alla volta
//!
//! ## Formati riconosciuti:
//! - **JPEG**: `.jpg`, `.jpeg`
//! - **PNG**: `.png`
//!
//! Qualunque errore di traversata viene restituito all'iteratore e
//! interrompe la run.

use crate::error::OptimizeError;
use crate::matcher::{normalize, PathMatcher};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Image formats the pipeline knows how to compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Detect the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("jpeg"),
            Self::Png => f.write_str("png"),
        }
    }
}

/// A candidate image found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub kind: ImageKind,
    pub size: u64,
}

impl ImageFile {
    /// Final path component, for progress lines.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Lazy iterator over the images under a root directory.
pub struct Walker<'a> {
    entries: walkdir::IntoIter,
    matcher: &'a PathMatcher,
    dry_run: bool,
    excluded: usize,
}

impl<'a> Walker<'a> {
    pub fn new(root: &Path, matcher: &'a PathMatcher) -> Self {
        Self {
            entries: WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
            matcher,
            dry_run: false,
            excluded: 0,
        }
    }

    /// Only changes how exclusions are logged.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Number of entries skipped by the exclude pattern so far.
    pub fn excluded(&self) -> usize {
        self.excluded
    }
}

impl Iterator for Walker<'_> {
    type Item = Result<ImageFile, OptimizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            if self.matcher.matches_path(entry.path()) {
                self.excluded += 1;
                debug!(
                    "{}excluded {} because of glob pattern passed to --exclude {:?}",
                    if self.dry_run { "(dryrun) " } else { "" },
                    normalize(entry.path()),
                    self.matcher.pattern()
                );
                if entry.file_type().is_dir() {
                    self.entries.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(kind) = ImageKind::from_path(entry.path()) else {
                continue;
            };

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => return Some(Err(e.into())),
            };

            trace!("Found {} image {}", kind, entry.path().display());
            return Some(Ok(ImageFile {
                path: entry.into_path(),
                kind,
                size,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, len: usize) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    fn names(root: &Path, matcher: &PathMatcher) -> Vec<String> {
        Walker::new(root, matcher)
            .map(|f| {
                let f = f.unwrap();
                f.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_image_kind_from_path() {
        assert_eq!(ImageKind::from_path(Path::new("a.jpg")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("a.JPEG")), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_path(Path::new("a.Png")), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_path(Path::new("a.webp")), None);
        assert_eq!(ImageKind::from_path(Path::new("jpg")), None);
    }

    #[test]
    fn test_filters_by_extension_in_name_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.PNG", 3);
        touch(dir.path(), "a.jpg", 5);
        touch(dir.path(), "notes.txt", 1);
        touch(dir.path(), "fake.gif", 1);
        touch(dir.path(), "sub/c.JPEG", 7);

        let matcher = PathMatcher::default();
        assert_eq!(names(dir.path(), &matcher), vec!["a.jpg", "b.PNG", "sub/c.JPEG"]);

        let files: Vec<_> = Walker::new(dir.path(), &matcher).map(Result::unwrap).collect();
        assert_eq!(files[0].size, 5);
        assert_eq!(files[0].kind, ImageKind::Jpeg);
        assert_eq!(files[0].name(), "a.jpg");
        assert_eq!(files[1].kind, ImageKind::Png);
    }

    #[test]
    fn test_excluded_directory_is_pruned() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "keep/a.jpg", 1);
        touch(dir.path(), "skip/b.jpg", 1);
        touch(dir.path(), "skip/deeper/c.png", 1);

        let pattern = format!("{}/skip", normalize(dir.path()));
        let matcher = PathMatcher::new(Some(&pattern)).unwrap();

        let mut walker = Walker::new(dir.path(), &matcher);
        let found: Vec<_> = walker.by_ref().map(Result::unwrap).collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("keep/a.jpg"));
        // only the directory itself is reported, its children are never visited
        assert_eq!(walker.excluded(), 1);
    }

    #[test]
    fn test_dot_slash_root_matches_clean_pattern() {
        // unit tests run from the package root
        let matcher = PathMatcher::new(Some("src/lib.rs")).unwrap();
        let mut walker = Walker::new(Path::new("./src"), &matcher);
        assert_eq!(walker.by_ref().count(), 0);
        assert_eq!(walker.excluded(), 1);
    }

    #[test]
    fn test_excluded_files_by_glob() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpg", 1);
        touch(dir.path(), "b.png", 1);
        touch(dir.path(), "sub/c.jpg", 1);

        let matcher = PathMatcher::new(Some("*.jpg")).unwrap();
        assert_eq!(names(dir.path(), &matcher), vec!["b.png"]);
    }

    #[test]
    fn test_excluded_root_yields_nothing() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpg", 1);

        let matcher = PathMatcher::new(Some("**")).unwrap();
        assert!(names(dir.path(), &matcher).is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let matcher = PathMatcher::default();
        let mut walker = Walker::new(&dir.path().join("nope"), &matcher);
        assert!(matches!(walker.next(), Some(Err(OptimizeError::Traversal(_)))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_yielded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "real.jpg", 1);
        std::os::unix::fs::symlink(dir.path().join("real.jpg"), dir.path().join("link.jpg"))
            .unwrap();

        let matcher = PathMatcher::default();
        assert_eq!(names(dir.path(), &matcher), vec!["real.jpg"]);
    }
}
