//! Lexical path cleaning vendored and adapted from `path-clean` crate,
//! <https://github.com/danreeves/path-clean>
//!
//! path-clean LICENSE-MIT:
//! Copyright (c) 2018 Dan Reeves
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy
//! of this software and associated documentation files (the "Software"), to deal
//! in the Software without restriction, including without limitation the rights
//! to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//! copies of the Software, and to permit persons to whom the Software is
//! furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all
//! copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//! IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//! AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//! LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//! OUT OF OR IN

use std::path::Component;

use camino::Utf8Path;
use camino::Utf8PathBuf;

pub trait Utf8PathClean {
    fn clean(&self) -> Utf8PathBuf;
}

impl Utf8PathClean for Utf8Path {
    fn clean(&self) -> Utf8PathBuf {
        clean_utf8_path(self)
    }
}

impl Utf8PathClean for Utf8PathBuf {
    fn clean(&self) -> Utf8PathBuf {
        clean_utf8_path(self)
    }
}

#[must_use]
pub fn clean_utf8_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Vec::new();

    for comp in path.as_std_path().components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => match out.last() {
                Some(Component::RootDir) => (),
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                None | Some(Component::CurDir | Component::ParentDir | Component::Prefix(_)) => {
                    out.push(comp);
                }
            },
            comp => out.push(comp),
        }
    }

    if out.is_empty() {
        return Utf8PathBuf::from(".");
    }

    // Every component came out of a `Utf8Path`, so joining them back stays UTF-8.
    let mut cleaned = Utf8PathBuf::new();
    for comp in out {
        if let Some(part) = comp.as_os_str().to_str() {
            cleaned.push(part);
        }
    }
    cleaned
}

/// Make `path` absolute against the current directory and clean it.
///
/// Relative paths are joined onto `std::env::current_dir()`; if that is
/// unavailable or not UTF-8 the path is only cleaned.
#[must_use]
pub fn absolute_utf8_path(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        return clean_utf8_path(path);
    }

    let Ok(cwd) = std::env::current_dir() else {
        return clean_utf8_path(path);
    };

    match Utf8PathBuf::from_path_buf(cwd) {
        Ok(cwd) => clean_utf8_path(&cwd.join(path)),
        Err(_) => clean_utf8_path(path),
    }
}

/// The directory one level up, or `None` once the filesystem root is reached.
///
/// A path whose parent would be itself (`/`, `C:\`) or empty (a bare relative
/// name) is its own fixed point.
#[must_use]
pub fn parent_dir(path: &Utf8Path) -> Option<&Utf8Path> {
    let parent = path.parent()?;
    if parent.as_str().is_empty() || parent == path {
        None
    } else {
        Some(parent)
    }
}

/// Whether a directory's final component is exactly `name`.
#[must_use]
pub fn has_dir_name(path: &Utf8Path, name: &str) -> bool {
    path.file_name() == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_dots() {
        assert_eq!(
            clean_utf8_path(Utf8Path::new("hello/world/..")),
            Utf8PathBuf::from("hello")
        );
    }

    #[test]
    fn test_clean_strips_trailing_separator() {
        assert_eq!(
            clean_utf8_path(Utf8Path::new("/ws/proj/")),
            Utf8PathBuf::from("/ws/proj")
        );
        assert_eq!(
            clean_utf8_path(Utf8Path::new("/ws/./proj//src/..")),
            Utf8PathBuf::from("/ws/proj")
        );
    }

    #[test]
    fn test_clean_cannot_escape_root() {
        assert_eq!(
            clean_utf8_path(Utf8Path::new("/../..")),
            Utf8PathBuf::from("/")
        );
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        assert_eq!(
            absolute_utf8_path(Utf8Path::new("/ws/proj/../other")),
            Utf8PathBuf::from("/ws/other")
        );
    }

    #[test]
    fn test_absolute_joins_relative_onto_cwd() {
        let resolved = absolute_utf8_path(Utf8Path::new("some/file.lean"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/file.lean"));
    }

    #[test]
    fn test_parent_dir_walks_up() {
        assert_eq!(
            parent_dir(Utf8Path::new("/ws/proj")),
            Some(Utf8Path::new("/ws"))
        );
        assert_eq!(parent_dir(Utf8Path::new("/ws")), Some(Utf8Path::new("/")));
    }

    #[test]
    fn test_parent_dir_stops_at_root() {
        assert_eq!(parent_dir(Utf8Path::new("/")), None);
    }

    #[test]
    fn test_has_dir_name() {
        assert!(has_dir_name(Utf8Path::new("/ws/proj/.lake"), ".lake"));
        assert!(!has_dir_name(Utf8Path::new("/ws/proj/.lake/build"), ".lake"));
        assert!(!has_dir_name(Utf8Path::new("/ws/building"), "build"));
    }
}
