//! Version token grammar.
//!
//! ```text
//! token  := "latest" | "first" | "prev" | "next"
//!         | "current" [ ("+" | "-") digits ]
//!         | literal
//! ```
//!
//! Tokens are parsed once into [`Target`]; resolution works on the enum.

use std::convert::Infallible;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, opt, value},
    sequence::{pair, preceded},
    IResult,
};

/// A symbolic version reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    Latest,
    First,
    Prev,
    Next,
    Current,
    /// `current+N` / `current-N`
    CurrentDelta(i64),
}

/// What the operator asked to migrate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Alias(Alias),
    Literal(String),
}

impl Target {
    /// Parse a raw token. Anything that is not an alias is a literal.
    pub fn parse(token: &str) -> Self {
        match all_consuming(parse_alias)(token) {
            Ok((_, alias)) => Target::Alias(alias),
            Err(_) => Target::Literal(token.to_string()),
        }
    }
}

impl FromStr for Target {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Target::parse(s))
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::Alias(Alias::Latest)
    }
}

fn parse_alias(input: &str) -> IResult<&str, Alias> {
    alt((
        value(Alias::Latest, tag("latest")),
        value(Alias::First, tag("first")),
        value(Alias::Prev, tag("prev")),
        value(Alias::Next, tag("next")),
        parse_current,
    ))(input)
}

fn parse_current(input: &str) -> IResult<&str, Alias> {
    map(preceded(tag("current"), opt(parse_delta)), |delta| match delta {
        Some(n) => Alias::CurrentDelta(n),
        None => Alias::Current,
    })(input)
}

/// `+N` / `-N`. Oversized deltas saturate; they can never be reached anyway.
fn parse_delta(input: &str) -> IResult<&str, i64> {
    map(
        pair(alt((value(1i64, char('+')), value(-1i64, char('-')))), digit1),
        |(sign, digits): (i64, &str)| {
            let magnitude = digits.bytes().fold(0i64, |acc, b| {
                acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
            });
            sign.saturating_mul(magnitude)
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_aliases() {
        assert_eq!(Target::parse("latest"), Target::Alias(Alias::Latest));
        assert_eq!(Target::parse("first"), Target::Alias(Alias::First));
        assert_eq!(Target::parse("prev"), Target::Alias(Alias::Prev));
        assert_eq!(Target::parse("next"), Target::Alias(Alias::Next));
        assert_eq!(Target::parse("current"), Target::Alias(Alias::Current));
    }

    #[test]
    fn test_current_delta() {
        assert_eq!(Target::parse("current+3"), Target::Alias(Alias::CurrentDelta(3)));
        assert_eq!(Target::parse("current-12"), Target::Alias(Alias::CurrentDelta(-12)));
        assert_eq!(Target::parse("current+0"), Target::Alias(Alias::CurrentDelta(0)));
    }

    #[test]
    fn test_delta_saturates() {
        assert_eq!(
            Target::parse("current+99999999999999999999999"),
            Target::Alias(Alias::CurrentDelta(i64::MAX))
        );
        assert_eq!(
            Target::parse("current-99999999999999999999999"),
            Target::Alias(Alias::CurrentDelta(-i64::MAX))
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            Target::parse("20200101000000"),
            Target::Literal("20200101000000".into())
        );
        // partial alias matches stay literal
        assert_eq!(Target::parse("latest2"), Target::Literal("latest2".into()));
        assert_eq!(Target::parse("current+"), Target::Literal("current+".into()));
        assert_eq!(Target::parse("current3"), Target::Literal("current3".into()));
        assert_eq!(Target::parse(""), Target::Literal(String::new()));
    }
}
