//! Motion-program collaborators: parser and artifact generators.
//!
//! The namespace reaches the parser and the preview writer through the
//! [`MotionParser`] and [`PreviewWriter`] traits so tests can substitute
//! counting or failing doubles.

pub mod border;
pub mod parser;
pub mod svg;

use std::path::{Path, PathBuf};

use crate::domain::ParsedGcode;
use crate::error::RelayError;

pub use border::BorderProgram;
pub use parser::GcodeParser;
pub use svg::SvgWriter;

/// Turns a motion file into per-segment arrays.
pub trait MotionParser: Send + Sync {
    /// Parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::FileNotFound`] when the file is missing,
    /// [`RelayError::Parse`] when its content cannot be interpreted and
    /// [`RelayError::Io`] for other read failures.
    fn parse(&self, path: &Path) -> Result<ParsedGcode, RelayError>;
}

/// Renders a toolpath preview to disk.
pub trait PreviewWriter: Send + Sync {
    /// Writes a preview of `positions` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Io`] when the file cannot be written.
    fn write(&self, positions: &[[f64; 3]], path: &Path, stroke_width: f64)
    -> Result<(), RelayError>;
}

/// Sibling path `<stem>_border<ext>` for the border program.
#[must_use]
pub fn border_path(filename: &Path) -> PathBuf {
    let stem = filename.file_stem().unwrap_or_default().to_string_lossy();
    let name = match filename.extension() {
        Some(ext) => format!("{stem}_border.{}", ext.to_string_lossy()),
        None => format!("{stem}_border"),
    };
    filename.with_file_name(name)
}

/// Sibling path `<stem>.svg` for the preview image.
#[must_use]
pub fn svg_path(filename: &Path) -> PathBuf {
    filename.with_extension("svg")
}
