use include_dir::{include_dir, Dir};

/// Browser UI bundle compiled into the binary. Served under `/static`.
pub static ASSETS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// Path of the single-page entry document inside [`ASSETS`].
pub const ENTRY_DOCUMENT: &str = "templates/index.html";
