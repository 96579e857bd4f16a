use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    sequence::pair,
    IResult,
};
use crate::chart::Selection;
use crate::parser::lexer::ws;

pub fn parse_scale_x_log10(input: &str) -> IResult<&str, Selection> {
    let (input, _) = ws(tag("scale_x_log10"))(input)?;
    let (input, _) = pair(ws(char('(')), ws(char(')')))(input)?;
    Ok((input, Selection::LogX(true)))
}

pub fn parse_scale_y_log10(input: &str) -> IResult<&str, Selection> {
    let (input, _) = ws(tag("scale_y_log10"))(input)?;
    let (input, _) = pair(ws(char('(')), ws(char(')')))(input)?;
    Ok((input, Selection::LogY(true)))
}

pub fn parse_scale_command(input: &str) -> IResult<&str, Vec<Selection>> {
    let (input, scale) = alt((parse_scale_x_log10, parse_scale_y_log10))(input)?;
    Ok((input, vec![scale]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_scales() {
        assert_eq!(parse_scale_command("scale_x_log10()"), Ok(("", vec![Selection::LogX(true)])));
        assert_eq!(
            parse_scale_command(" scale_y_log10( ) "),
            Ok(("", vec![Selection::LogY(true)]))
        );
        assert!(parse_scale_command("scale_x_reverse()").is_err());
    }
}
