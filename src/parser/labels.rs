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

pub fn parse_labs(input: &str) -> IResult<&str, Vec<Selection>> {
    let (input, _) = ws(tag("labs"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, labels) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("title:")), ws(string_literal)), Selection::Title),
            map(preceded(ws(tag("x:")), ws(string_literal)), Selection::XLabel),
            map(preceded(ws(tag("y:")), ws(string_literal)), Selection::YLabel),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labs() {
        let result = parse_labs(r#"labs(title: "My Chart", x: "X Axis")"#);
        assert!(result.is_ok());
        let (_, labels) = result.unwrap();
        assert_eq!(
            labels,
            vec![
                Selection::Title("My Chart".to_string()),
                Selection::XLabel("X Axis".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_labs_requires_quotes() {
        assert!(parse_labs("labs(title: Sales)").is_err());
    }
}
