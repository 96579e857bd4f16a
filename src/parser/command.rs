// Chart command parser: `<type>(role: column, ...)`

use super::ast::ChartRequest;
use super::lexer::{column_ref, identifier, ws};
use crate::chart::{ChartType, Role, Selection};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{map, map_res},
    error::{Error, ErrorKind},
    multi::{separated_list0, separated_list1},
    sequence::delimited,
    IResult,
};

/// Parse `[a, "b c", d]`
fn column_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('[')),
        separated_list1(ws(char(',')), ws(column_ref)),
        ws(char(']')),
    )(input)
}

/// Parse one `role: column` mapping. A list maps the role several times
/// (hierarchy paths).
fn mapping(input: &str) -> IResult<&str, Vec<Selection>> {
    let (rest, key) = ws(identifier)(input)?;
    let Some(role) = Role::from_key(&key) else {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    };
    let (rest, _) = ws(char(':'))(rest)?;

    alt((
        map(column_list, move |columns| {
            columns
                .into_iter()
                .map(|c| Selection::Column(role, c))
                .collect()
        }),
        map(ws(column_ref), move |c| vec![Selection::Column(role, c)]),
    ))(rest)
}

/// Parse a chart command
/// Format: pie(names: region, values: sales) or treemap(path: [a, b], values: v)
pub fn parse_chart_command(input: &str) -> IResult<&str, ChartRequest> {
    let (input, chart_type) = map_res(ws(identifier), |name| name.parse::<ChartType>())(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, mappings) = separated_list0(ws(char(',')), mapping)(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((
        input,
        ChartRequest {
            chart_type,
            selections: mappings.into_iter().flatten().collect(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pie() {
        let (rest, request) = parse_chart_command("pie(names: region, values: sales)").unwrap();
        assert_eq!(rest, "");
        assert_eq!(request.chart_type, ChartType::Pie);
        assert_eq!(
            request.selections,
            vec![
                Selection::column(Role::Names, "region"),
                Selection::column(Role::Values, "sales"),
            ]
        );
    }

    #[test]
    fn test_parse_quoted_columns() {
        let (_, request) =
            parse_chart_command(r#"bar(x: Region, y: "Sales Amount", color: Region)"#).unwrap();
        assert_eq!(request.selections[1], Selection::column(Role::Y, "Sales Amount"));
        assert_eq!(request.selections.len(), 3);
    }

    #[test]
    fn test_parse_path_list() {
        let (_, request) =
            parse_chart_command("treemap(path: [continent, country], values: pop)").unwrap();
        assert_eq!(request.chart_type, ChartType::Treemap);
        assert_eq!(
            request.selections[..2],
            [
                Selection::column(Role::Path, "continent"),
                Selection::column(Role::Path, "country"),
            ]
        );
    }

    #[test]
    fn test_parse_chart_type_is_case_insensitive() {
        let (_, request) = parse_chart_command("Heatmap()").unwrap();
        assert_eq!(request.chart_type, ChartType::Heatmap);
        assert!(request.selections.is_empty());
    }

    #[test]
    fn test_unknown_chart_type() {
        assert!(parse_chart_command("radar(x: a)").is_err());
    }

    #[test]
    fn test_unknown_role() {
        assert!(parse_chart_command("scatter(x: a, hue: b)").is_err());
    }

    #[test]
    fn test_unclosed_paren() {
        assert!(parse_chart_command("line(x: a, y: b").is_err());
    }
}
