// Pipeline parser for chart expressions

use super::ast::ChartRequest;
use super::command::parse_chart_command;
use super::labels::parse_labs;
use super::lexer::ws;
use super::options::{parse_options, parse_size};
use super::scale::parse_scale_command;
use super::theme::{parse_style, parse_theme_preset};
use crate::chart::Selection;
use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{eof, opt},
    multi::many0,
    sequence::preceded,
    IResult,
};

fn parse_pipeline_component(input: &str) -> IResult<&str, Vec<Selection>> {
    alt((
        parse_labs,
        parse_style,
        parse_theme_preset,
        parse_size,
        parse_options,
        parse_scale_command,
    ))(input)
}

/// Parse a complete chart expression
/// Format: chart(...) | component | ...
pub fn parse_chart_spec(input: &str) -> IResult<&str, ChartRequest> {
    // Optional: consume leading "df"
    let (input, _) = opt(ws(tag("df")))(input)?;

    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    // The chart command comes first
    let (input, mut request) = parse_chart_command(input)?;

    // Then any number of "| component"
    let (input, components) =
        many0(preceded(ws(tag("|")), parse_pipeline_component))(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    request
        .selections
        .extend(components.into_iter().flatten());

    Ok((input, request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartType, Role};

    #[test]
    fn test_parse_chart_only() {
        let (_, request) = parse_chart_spec("line(x: date, y: sales)").unwrap();
        assert_eq!(request.chart_type, ChartType::Line);
        assert_eq!(request.selections.len(), 2);
    }

    #[test]
    fn test_parse_full_pipeline() {
        let input = r#"pie(names: region, values: sales) | labs(title: "Sales") | size(width: 900, height: 500)"#;
        let (_, request) = parse_chart_spec(input).unwrap();
        assert_eq!(request.chart_type, ChartType::Pie);
        assert_eq!(
            request.selections,
            vec![
                Selection::column(Role::Names, "region"),
                Selection::column(Role::Values, "sales"),
                Selection::Title("Sales".into()),
                Selection::Width(900.0),
                Selection::Height(500.0),
            ]
        );
    }

    #[test]
    fn test_parse_with_df_prefix() {
        let result = parse_chart_spec("df | histogram(x: value) | options(nbins: 5)");
        assert!(result.is_ok());
        let (_, request) = result.unwrap();
        assert_eq!(request.chart_type, ChartType::Histogram);
        assert_eq!(request.selections.last(), Some(&Selection::Nbins(5.0)));
    }

    #[test]
    fn test_parse_scales_and_theme() {
        let (_, request) =
            parse_chart_spec("scatter(x: a, y: b) | scale_x_log10() | theme_seaborn()").unwrap();
        assert!(request.selections.contains(&Selection::LogX(true)));
        assert!(request.selections.contains(&Selection::Template("seaborn".into())));
    }

    #[test]
    fn test_parse_trailing_pipe() {
        // Trailing pipe should fail (nothing after last pipe)
        assert!(parse_chart_spec("bar(x: a, y: b) |").is_err());
    }

    #[test]
    fn test_parse_missing_chart_command() {
        // Components without a chart command should fail
        assert!(parse_chart_spec(r#"labs(title: "x")"#).is_err());
    }

    #[test]
    fn test_parse_empty_input() {
        // Empty input should fail
        assert!(parse_chart_spec("").is_err());
    }

    #[test]
    fn test_parse_two_chart_commands() {
        assert!(parse_chart_spec("bar(x: a, y: b) | line(x: a, y: b)").is_err());
    }
}
