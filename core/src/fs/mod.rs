//! File system access layer: path encoding, directory scanning, and read-only helpers.

pub mod path;
pub mod scan;
pub mod text;
mod util;

pub use path::{APP_PATH_SEPARATOR, to_app_path, to_native_path, to_native_path_with};
pub use scan::{scan_directory, scan_directory_async, sort_entries};
pub use text::{list_drive_roots, read_text_file};
pub use util::{
    IMAGE_EXTENSIONS, TEXT_EXTENSIONS, Token, VIDEO_EXTENSIONS, classify_file, fold_name,
    natural_cmp, natural_cmp_names, tokenize,
};

/// Shared result type for fs operations.
pub type Result<T> = crate::Result<T>;
