// Size and per-chart option commands

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list0,
    sequence::preceded,
    IResult,
};
use crate::chart::Selection;
use crate::parser::lexer::{boolean_literal, number_literal, ws};

/// Parse size(width: 900, height: 500)
pub fn parse_size(input: &str) -> IResult<&str, Vec<Selection>> {
    let (input, _) = ws(tag("size"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, dims) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("width:")), ws(number_literal)), Selection::Width),
            map(preceded(ws(tag("height:")), ws(number_literal)), Selection::Height),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;
    Ok((input, dims))
}

/// Parse options(nbins: 30, size_max: 40, markers: true)
pub fn parse_options(input: &str) -> IResult<&str, Vec<Selection>> {
    let (input, _) = ws(tag("options"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, options) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("nbins:")), ws(number_literal)), Selection::Nbins),
            map(preceded(ws(tag("size_max:")), ws(number_literal)), Selection::SizeMax),
            map(preceded(ws(tag("markers:")), ws(boolean_literal)), Selection::Markers),
            map(preceded(ws(tag("log_x:")), ws(boolean_literal)), Selection::LogX),
            map(preceded(ws(tag("log_y:")), ws(boolean_literal)), Selection::LogY),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;
    Ok((input, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(
            parse_size("size(width: 900, height: 500)"),
            Ok(("", vec![Selection::Width(900.0), Selection::Height(500.0)]))
        );
    }

    #[test]
    fn test_parse_size_keeps_out_of_range_for_build() {
        let (_, dims) = parse_size("size(width: 5000)").unwrap();
        assert_eq!(dims, vec![Selection::Width(5000.0)]);
    }

    #[test]
    fn test_parse_options() {
        let (_, options) = parse_options("options(nbins: 30, markers: true, log_y: false)").unwrap();
        assert_eq!(
            options,
            vec![
                Selection::Nbins(30.0),
                Selection::Markers(true),
                Selection::LogY(false),
            ]
        );
    }

    #[test]
    fn test_parse_options_rejects_text_number() {
        assert!(parse_options(r#"options(nbins: "30")"#).is_err());
    }
}
