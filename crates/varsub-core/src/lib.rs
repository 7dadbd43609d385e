//! varsub-core: shell-style variable interpolation for configuration text
//!
//! This crate resolves `$VAR`, `${VAR}`, `${VAR-default}` and
//! `${VAR:-default}` references in raw configuration text against a
//! mapping of variables, with `$$` as the literal-dollar escape. It
//! operates on the string before any structural parsing.
//!
//! # Example
//!
//! ```rust
//! use varsub_core::{interpolate, Mapping};
//!
//! let mut vars = Mapping::new();
//! vars.insert("HOST".to_string(), "localhost".to_string());
//!
//! let resolved = interpolate("host: ${HOST:-0.0.0.0}\nport: ${PORT:-5432}", &vars).unwrap();
//! assert_eq!(resolved, "host: localhost\nport: 5432");
//! ```

pub mod error;
pub mod interpolation;
pub mod interpolator;
pub mod loader;

pub use error::{Error, ErrorKind, Result};
pub use interpolator::{interpolate, Interpolator, Mapping};
pub use loader::{Loader, LoaderOptions};
