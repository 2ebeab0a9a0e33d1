//! # Time Parsing Feature
//!
//! Natural-language time expressions and compact durations.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod duration;
pub mod parser;

pub use duration::{format_duration, parse_duration, parse_std_duration};
pub use parser::{ParseError, TimeParser, TIME_EXAMPLES};
