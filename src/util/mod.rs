//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **URL validation**: Security-focused validation of source URLs and links
//! - **Text processing**: Control-character stripping
//!
//! # Examples
//!
//! ```
//! use feedme::util::{strip_control_chars, validate_url, HostPolicy};
//!
//! let url = validate_url("https://example.com/feed.xml", HostPolicy::PublicOnly).unwrap();
//! assert_eq!(strip_control_chars("Q&A\x07"), "Q&A");
//! ```

mod text;
mod url_validator;

pub use text::strip_control_chars;
pub use url_validator::{is_http_link, validate_url, HostPolicy, UrlValidationError};
