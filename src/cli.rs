use std::{net::IpAddr, path::PathBuf};

use clap::Parser;

use crate::config::{RawConfig, DEFAULT_PORT};

/// Share files, a folder, a message or a text file with any browser on the
/// local network.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to share (directories are shared recursively)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// A file or directory to share, may be repeated
    #[arg(short = 'i', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// A directory whose files are shared, hidden entries excluded
    #[arg(short, long, value_name = "DIR", env = "RAINDROP_DIR")]
    pub dir: Option<PathBuf>,

    /// A text file whose contents are shown on the page
    #[arg(short = 'I', long, value_name = "FILE", env = "RAINDROP_CONTENT")]
    pub content: Option<PathBuf>,

    /// A message shown on the page
    #[arg(short, long, value_name = "TEXT", env = "RAINDROP_MESSAGE", default_value = "")]
    pub message: String,

    /// Port to listen on
    #[arg(
        short,
        long,
        value_name = "PORT",
        env = "RAINDROP_PORT",
        default_value = DEFAULT_PORT,
        allow_hyphen_values = true
    )]
    pub port: String,

    /// Address to bind to
    #[arg(short, long, value_name = "ADDR", env = "RAINDROP_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Unvalidated configuration; positional paths come before `-i` paths.
    pub fn raw_config(&self) -> RawConfig {
        RawConfig {
            shared_paths: self.paths.iter().chain(&self.files).cloned().collect(),
            shared_dir: self.dir.clone(),
            message: self.message.clone(),
            content_path: self.content.clone(),
            port: self.port.clone(),
        }
    }
}
