mod core;
mod json_formatter;
mod registry;
mod text_formatter;

pub use core::LogFormatter;
pub use json_formatter::{JsonFormatter, JsonFormatterConfig};
pub use registry::{create_formatter_from_options, register_formatters};
pub use text_formatter::{TextFormatter, TextFormatterConfig};
