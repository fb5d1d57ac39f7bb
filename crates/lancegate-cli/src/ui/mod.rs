//! # CLI UI Module
//!
//! Consistent styling and formatting for lancegate CLI output.
//!
//! Human-readable output uses `[ok]`/`[err]`-style prefixes and aligned
//! tables; every listing command also has a `--json` form for scripting.
//! Colors are disabled when `NO_COLOR` is set or stdout is not a TTY.
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal capability checks
//! - `style`: Message types, prefixes, and styling functions
//! - `format`: Utility formatters (vectors, distances, time, truncation)
//! - `table`: Table rendering with comfy-table

pub mod color;
pub mod format;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use style::{MessageType, Style};
