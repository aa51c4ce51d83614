//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: catalog base URL policy and safe outgoing links
//! - **Text processing**: markup stripping, whitespace collapsing and truncation
//!
//! # Examples
//!
//! ```
//! use podcast_gallery::util::{strip_markup, truncate_chars, validate_link};
//!
//! let text = strip_markup("<p>A weekly show about <b>Rust</b></p>");
//! assert_eq!(truncate_chars(&text, 8), "A weekly…");
//! assert!(validate_link("https://example.com").is_ok());
//! ```

mod text;
mod url_validator;

pub use text::{collapse_whitespace, strip_control_chars, strip_markup, truncate_chars};
pub use url_validator::{validate_base_url, validate_link, UrlValidationError};
