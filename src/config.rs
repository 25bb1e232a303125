use std::{
    env, fs,
    path::{Component, Path, PathBuf},
};

use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_PORT: &str = "1130";

/// Configuration as supplied by the user, nothing checked yet.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    /// Files or directories to share. Directories are expanded.
    pub shared_paths: Vec<PathBuf>,
    /// A directory to share. Must be a directory.
    pub shared_dir: Option<PathBuf>,
    pub message: String,
    /// File whose text is exposed verbatim.
    pub content_path: Option<PathBuf>,
    pub port: String,
}

/// Validated, read-only configuration shared by every request.
///
/// Every entry of `shared_paths` is an absolute path to a regular file as of
/// startup; `content_path` likewise. Nothing guarantees they stay that way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub shared_paths: Vec<PathBuf>,
    pub message: String,
    pub content_path: Option<PathBuf>,
    pub port: u16,
}

impl RawConfig {
    /// Checks the port and every path, expanding directories into the files
    /// they contain. Fails on the first problem found.
    pub fn validate(self) -> Result<Config, ConfigError> {
        let port = parse_port(&self.port)?;

        if self.shared_paths.is_empty()
            && self.shared_dir.is_none()
            && self.content_path.is_none()
            && self.message.is_empty()
        {
            return Err(ConfigError::NothingToShare);
        }

        let mut shared_paths = Vec::new();
        for path in &self.shared_paths {
            let absolute = absolute_path(path)?;
            let metadata = stat(&absolute)?;
            if metadata.is_dir() {
                shared_paths.extend(expand_dir(&absolute)?);
            } else {
                shared_paths.push(absolute);
            }
        }

        if let Some(dir) = &self.shared_dir {
            let dir = validate_path(dir, true)?;
            shared_paths.extend(expand_dir(&dir)?);
        }

        let content_path = self
            .content_path
            .as_deref()
            .map(|path| validate_path(path, false))
            .transpose()?;

        Ok(Config {
            shared_paths,
            message: self.message,
            content_path,
            port,
        })
    }
}

/// Parses a port given as text and range-checks it.
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;
    validate_port(value)
}

pub fn validate_port(value: i64) -> Result<u16, ConfigError> {
    match u16::try_from(value) {
        Ok(port) if port >= 1 => Ok(port),
        _ => Err(ConfigError::InvalidPort(value.to_string())),
    }
}

/// Resolves `path` to an absolute path and checks that it exists and is a
/// directory (`must_be_dir`) or not a directory.
pub fn validate_path(path: &Path, must_be_dir: bool) -> Result<PathBuf, ConfigError> {
    let absolute = absolute_path(path)?;
    let metadata = stat(&absolute)?;

    match (must_be_dir, metadata.is_dir()) {
        (true, false) => Err(ConfigError::NotADirectory(absolute)),
        (false, true) => Err(ConfigError::IsADirectory(absolute)),
        _ => Ok(absolute),
    }
}

/// Collects every file below `root`, at any depth, skipping entries whose
/// name starts with `.`. Dot-directories are never descended into.
///
/// Symlinks to files are kept; symlinked directories are not followed.
pub fn expand_dir(root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)
            .and_then(|reader| reader.collect::<Result<Vec<_>, _>>())
            .map_err(|e| ConfigError::from_io(dir.clone(), e))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let path = entry.path();
            if entry.file_name().to_string_lossy().starts_with('.') {
                debug!(path = %path.display(), "skipping hidden entry");
                continue;
            }

            let file_type = entry
                .file_type()
                .map_err(|e| ConfigError::from_io(path.clone(), e))?;

            if file_type.is_dir() {
                subdirs.push(path);
            } else if file_type.is_file() {
                files.push(path);
            } else if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(target) if target.is_file() => files.push(path),
                    Ok(_) => debug!(path = %path.display(), "skipping symlinked directory"),
                    Err(e) => debug!(path = %path.display(), error = %e, "skipping dangling symlink"),
                }
            } else {
                debug!(path = %path.display(), "skipping special file");
            }
        }

        // Reversed so the stack yields subdirectories in name order.
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(files)
}

fn stat(path: &Path) -> Result<fs::Metadata, ConfigError> {
    fs::metadata(path).map_err(|e| ConfigError::from_io(path.to_path_buf(), e))
}

/// Makes `path` absolute against the working directory and cleans it
/// lexically: `.` is dropped and `..` removes the preceding component.
fn absolute_path(path: &Path) -> Result<PathBuf, ConfigError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(ConfigError::CurrentDir)?
            .join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(b"data").unwrap();
    }

    fn raw_with_message() -> RawConfig {
        RawConfig {
            message: "hello".to_string(),
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_ports_in_range() {
        for port in [1_i64, 80, 1130, 8080, 65535] {
            assert_eq!(validate_port(port).unwrap() as i64, port);
        }
        assert_eq!(parse_port(" 1130 ").unwrap(), 1130);
    }

    #[test]
    fn rejects_ports_out_of_range_naming_the_value() {
        for port in [0_i64, -1, 65536, 100_000, i64::MIN] {
            let err = validate_port(port).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPort(_)));
            assert!(err.to_string().contains(&port.to_string()));
        }

        let err = parse_port("http").unwrap_err();
        assert!(err.to_string().contains("'http'"));
    }

    #[test]
    fn invalid_port_fails_before_paths_are_checked() {
        let raw = RawConfig {
            shared_paths: vec![PathBuf::from("/definitely/not/here")],
            port: "70000".to_string(),
            ..Default::default()
        };
        assert!(matches!(raw.validate(), Err(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn requires_something_to_share() {
        let raw = RawConfig {
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        };
        assert!(matches!(raw.validate(), Err(ConfigError::NothingToShare)));
    }

    #[test]
    fn message_only_config_is_valid() {
        let config = raw_with_message().validate().unwrap();
        assert_eq!(config.message, "hello");
        assert_eq!(config.port, 1130);
        assert!(config.shared_paths.is_empty());
        assert!(config.content_path.is_none());
    }

    #[test]
    fn missing_path_reports_absolute_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.txt");

        let err = validate_path(&missing, false).unwrap_err();
        assert!(matches!(&err, ConfigError::NotFound(p) if p == &missing));
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn type_mismatches_are_reported() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        touch(&file);

        let err = validate_path(&file, true).unwrap_err();
        assert!(matches!(&err, ConfigError::NotADirectory(p) if p == &file));

        let err = validate_path(tmp.path(), false).unwrap_err();
        assert!(matches!(err, ConfigError::IsADirectory(_)));

        assert_eq!(validate_path(&file, false).unwrap(), file);
        assert_eq!(validate_path(tmp.path(), true).unwrap(), tmp.path());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let resolved = absolute_path(Path::new("./some/file.txt")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/file.txt"));
        assert!(!resolved
            .components()
            .any(|c| matches!(c, Component::CurDir)));
    }

    #[test]
    fn parent_components_are_resolved_lexically() {
        let resolved = absolute_path(Path::new("/srv/share/sub/../a.txt")).unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/share/a.txt"));

        let resolved = absolute_path(Path::new("/../etc/./hosts")).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn validated_paths_have_no_parent_components() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        touch(&file);
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let roundabout = tmp.path().join("sub").join("..").join("a.txt");
        assert_eq!(validate_path(&roundabout, false).unwrap(), file);
    }

    #[cfg(unix)]
    #[test]
    fn expand_dir_skips_sockets_and_other_special_files() {
        use std::os::unix::net::UnixListener;

        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.txt"));
        let _listener = UnixListener::bind(tmp.path().join("control.sock")).unwrap();

        let files = expand_dir(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("a.txt")]);
    }

    #[test]
    fn expand_dir_skips_dotfiles_and_dot_directories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.txt"));
        touch(&tmp.path().join(".hidden"));
        touch(&tmp.path().join(".git/x"));
        touch(&tmp.path().join("sub/b.txt"));
        touch(&tmp.path().join("sub/.env"));
        touch(&tmp.path().join("sub/deeper/c.txt"));

        let files = expand_dir(tmp.path()).unwrap();

        assert_eq!(
            files,
            vec![
                tmp.path().join("a.txt"),
                tmp.path().join("sub/b.txt"),
                tmp.path().join("sub/deeper/c.txt"),
            ]
        );
    }

    #[test]
    fn shared_directory_is_flattened_into_files() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.txt"));
        touch(&tmp.path().join(".hidden"));
        touch(&tmp.path().join(".git/x"));

        let raw = RawConfig {
            shared_dir: Some(tmp.path().to_path_buf()),
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        };
        let config = raw.validate().unwrap();

        assert_eq!(config.shared_paths, vec![tmp.path().join("a.txt")]);
    }

    #[test]
    fn shared_paths_accept_files_and_directories_in_order() {
        let tmp = TempDir::new().unwrap();
        let single = tmp.path().join("single.bin");
        touch(&single);
        touch(&tmp.path().join("folder/one.txt"));
        touch(&tmp.path().join("folder/two.txt"));

        let raw = RawConfig {
            shared_paths: vec![single.clone(), tmp.path().join("folder")],
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        };
        let config = raw.validate().unwrap();

        assert_eq!(
            config.shared_paths,
            vec![
                single,
                tmp.path().join("folder/one.txt"),
                tmp.path().join("folder/two.txt"),
            ]
        );
    }

    #[test]
    fn shared_dir_must_be_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        touch(&file);

        let raw = RawConfig {
            shared_dir: Some(file),
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        };
        assert!(matches!(raw.validate(), Err(ConfigError::NotADirectory(_))));
    }

    #[test]
    fn content_path_must_be_a_file() {
        let tmp = TempDir::new().unwrap();

        let raw = RawConfig {
            content_path: Some(tmp.path().to_path_buf()),
            ..raw_with_message()
        };
        assert!(matches!(raw.validate(), Err(ConfigError::IsADirectory(_))));

        let snippet = tmp.path().join("snippet.txt");
        touch(&snippet);
        let raw = RawConfig {
            content_path: Some(snippet.clone()),
            ..raw_with_message()
        };
        assert_eq!(raw.validate().unwrap().content_path, Some(snippet));
    }

    #[test]
    fn missing_shared_path_aborts_validation() {
        let tmp = TempDir::new().unwrap();
        let raw = RawConfig {
            shared_paths: vec![tmp.path().join("gone.txt")],
            port: DEFAULT_PORT.to_string(),
            ..Default::default()
        };
        assert!(matches!(raw.validate(), Err(ConfigError::NotFound(_))));
    }
}
