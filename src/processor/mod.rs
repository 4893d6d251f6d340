pub mod field_parser;
pub mod page_extractor;

pub use field_parser::*;
pub use page_extractor::*;
