//! Rendering of resolved results.
//!
//! # Submodules
//!
//! - [`text`]: plain-text pages for the terminal
//! - [`json`]: JSON snapshot files for other tools
//!
//! # Snapshot Structure
//!
//! ```text
//! json_output_dir/
//! └── 2024-05-06/
//!     ├── categories.json
//!     ├── upsc.json
//!     └── upsc_daily_p1.json
//! ```

pub mod json;
pub mod text;
