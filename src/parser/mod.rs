// Chart expression parser module

pub mod ast;
pub mod command;
pub mod labels;
pub mod lexer;
pub mod options;
pub mod pipeline;
pub mod scale;
pub mod theme;

use anyhow::{anyhow, Result};

// Public API re-exports
pub use ast::ChartRequest;
pub use pipeline::parse_chart_spec;

/// Parse a whole chart expression, reporting any failure as a message.
pub fn parse_chart_request(input: &str) -> Result<ChartRequest> {
    match parse_chart_spec(input) {
        Ok((_, request)) => Ok(request),
        Err(e) => Err(anyhow!("Invalid chart expression '{}': {}", input.trim(), e)),
    }
}
