// Parser module: provider payload decoding.

pub mod chart_parser;

pub use chart_parser::ChartParser;
