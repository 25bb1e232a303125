use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use humansize::{format_size, FormatSizeOptions, BINARY};
use tracing::{error, warn};

use crate::config::Config;

/// A shareable file as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub human_size: String,
}

/// What is shareable right now, computed fresh for one request.
///
/// `files` and the name index always agree: every listed name maps to exactly
/// one path and nothing else is indexed.
#[derive(Debug, Clone, Default)]
pub struct SharedContent {
    files: Vec<FileEntry>,
    file_index: HashMap<String, PathBuf>,
    pub message: String,
    pub snippet: String,
}

impl SharedContent {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Looks up the path behind a display name.
    pub fn path_for(&self, name: &str) -> Option<&Path> {
        self.file_index
            .get(name)
            .map(PathBuf::as_path)
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Adds a file under `name`. The first file registered under a name wins;
    /// returns `false` when `name` was already taken.
    pub fn insert_file(&mut self, name: String, size: u64, path: PathBuf) -> bool {
        if self.file_index.contains_key(&name) {
            return false;
        }
        self.files.push(FileEntry {
            name: name.clone(),
            human_size: format_file_size(size),
        });
        self.file_index.insert(name, path);
        true
    }

    /// True when there is no file, no message and no snippet.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.message.is_empty() && self.snippet.is_empty()
    }
}

/// Produces a [`SharedContent`] snapshot from the configuration.
///
/// The HTTP layer only depends on this, so tests can hand it canned snapshots.
pub trait ContentSource: Send + Sync {
    fn resolve(&self, config: &Config) -> SharedContent;
}

/// Reads the local filesystem on every call. One bad path never aborts the
/// whole resolution; it is logged and left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalContent;

impl ContentSource for LocalContent {
    fn resolve(&self, config: &Config) -> SharedContent {
        let mut content = SharedContent::with_message(config.message.clone());

        for path in &config.shared_paths {
            let metadata = match fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "cannot stat shared path");
                    continue;
                }
            };

            if metadata.is_dir() {
                warn!(path = %path.display(), "shared path is now a directory, skipping");
                continue;
            }

            let Some(name) = display_name(path) else {
                warn!(path = %path.display(), "shared path has no usable file name");
                continue;
            };

            if !content.insert_file(name.clone(), metadata.len(), path.clone()) {
                warn!(
                    file_name = %name,
                    path = %path.display(),
                    "file name collision, keeping the first file"
                );
            }
        }

        if let Some(content_path) = &config.content_path {
            match fs::read(content_path) {
                Ok(raw) => content.snippet = String::from_utf8_lossy(&raw).into_owned(),
                Err(e) => {
                    error!(path = %content_path.display(), error = %e, "cannot read content file");
                }
            }
        }

        if content.is_empty() {
            warn!("all shared content is empty");
        }

        content
    }
}

fn display_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Binary-prefixed size with two decimals ("1.00 MiB"); plain bytes below 1 KiB.
pub fn format_file_size(size: u64) -> String {
    if size < 1024 {
        return format!("{size} B");
    }
    let options = FormatSizeOptions::from(BINARY)
        .decimal_places(2)
        .decimal_zeroes(2);
    format_size(size, options)
}
