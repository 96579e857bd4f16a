// Lexical helpers shared by the chart expression parsers

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, opt, recognize, value},
    multi::many0_count,
    number::complete::double,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare name: letters, digits and underscores, not starting with a digit
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        String::from,
    )(input)
}

/// Double-quoted string with `\"` and `\\` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

pub fn boolean_literal(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("true")), value(false, tag("false"))))(input)
}

/// A column name: bare when it is an identifier, quoted otherwise
pub fn column_ref(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("facet_col: x"), Ok((": x", "facet_col".to_string())));
        assert!(identifier("1abc").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            string_literal(r#""Sales Amount" rest"#),
            Ok((" rest", "Sales Amount".to_string()))
        );
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
        assert_eq!(
            string_literal(r#""say \"hi\"""#),
            Ok(("", "say \"hi\"".to_string()))
        );
    }

    #[test]
    fn test_number_and_boolean() {
        assert_eq!(number_literal("900)"), Ok((")", 900.0)));
        assert_eq!(boolean_literal("false"), Ok(("", false)));
    }

    #[test]
    fn test_column_ref() {
        assert_eq!(column_ref("region,"), Ok((",", "region".to_string())));
        assert_eq!(column_ref(r#""Units Sold""#), Ok(("", "Units Sold".to_string())));
    }

    #[test]
    fn test_ws() {
        let mut parser = ws(tag("labs"));
        assert_eq!(parser("  labs  ("), Ok(("(", "labs")));
    }
}
