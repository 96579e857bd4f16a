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
use crate::parser::lexer::{string_literal, ws};

/// Parse style(template: "plotly_dark", palette: "Set1", ...)
///
/// Choice names are validated when the chart is built, so a misspelt
/// template reports the accepted names instead of a parse position.
pub fn parse_style(input: &str) -> IResult<&str, Vec<Selection>> {
    let (input, _) = ws(tag("style"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, choices) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("template:")), ws(string_literal)), Selection::Template),
            map(preceded(ws(tag("palette:")), ws(string_literal)), Selection::Palette),
            map(preceded(ws(tag("color_scale:")), ws(string_literal)), Selection::ColorScale),
            map(preceded(ws(tag("line_shape:")), ws(string_literal)), Selection::LineShape),
            map(preceded(ws(tag("orientation:")), ws(string_literal)), Selection::Orientation),
            map(preceded(ws(tag("histnorm:")), ws(string_literal)), Selection::HistNorm),
            map(preceded(ws(tag("marginal_x:")), ws(string_literal)), Selection::MarginalX),
            map(preceded(ws(tag("marginal_y:")), ws(string_literal)), Selection::MarginalY),
            map(preceded(ws(tag("trendline:")), ws(string_literal)), Selection::Trendline),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, choices))
}

/// Parse theme_<template>(), shorthand for style(template: "<template>")
pub fn parse_theme_preset(input: &str) -> IResult<&str, Vec<Selection>> {
    let (input, _) = ws(tag("theme_"))(input)?;
    let (input, name) = alt((
        tag("plotly_white"),
        tag("plotly_dark"),
        tag("plotly"),
        tag("ggplot2"),
        tag("seaborn"),
        tag("simple_white"),
    ))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, vec![Selection::Template(name.to_string())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style() {
        let (rest, choices) =
            parse_style(r#"style(template: "seaborn", palette: "Set2", trendline: "ols")"#)
                .unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            choices,
            vec![
                Selection::Template("seaborn".into()),
                Selection::Palette("Set2".into()),
                Selection::Trendline("ols".into()),
            ]
        );
    }

    #[test]
    fn test_parse_style_keeps_unknown_choice_for_build() {
        let (_, choices) = parse_style(r#"style(color_scale: "Rainbow")"#).unwrap();
        assert_eq!(choices, vec![Selection::ColorScale("Rainbow".into())]);
    }

    #[test]
    fn test_parse_style_unknown_key() {
        assert!(parse_style(r#"style(font: "Arial")"#).is_err());
    }

    #[test]
    fn test_theme_preset() {
        assert_eq!(
            parse_theme_preset("theme_plotly_dark()"),
            Ok(("", vec![Selection::Template("plotly_dark".into())]))
        );
        assert_eq!(
            parse_theme_preset("theme_plotly()"),
            Ok(("", vec![Selection::Template("plotly".into())]))
        );
        assert!(parse_theme_preset("theme_minimal()").is_err());
    }
}
