//! nom parsers for the attribute values templates may carry.
//!
//! Every public `parse_*` function is a complete nom parser; [`parse_value`]
//! runs one against a whole attribute value and turns leftovers into a
//! [`StyleParseError`].

use crate::dimension::{PageMargins, PageSize, PaperSeries};
use crate::font::FontFamily;
use crate::text::TextAlign;
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit1, space0, u32 as parse_u32};
use nom::combinator::{all_consuming, map, map_res, opt, value};
use nom::error::Error as NomError;
use nom::number::complete::float;
use nom::sequence::{delimited, terminated};
use nom::{IResult, Parser};
use thiserror::Error;

/// Errors that can occur while parsing attribute values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleParseError {
    #[error("Invalid value for '{property}': {value}")]
    InvalidValue { property: String, value: String },
}

// --- Helper Parsers ---

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = NomError<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = NomError<&'a str>>,
{
    delimited(space0, inner, space0)
}

/// Runs `parser` over the whole of `input`, reporting failures against `property`.
pub fn parse_value<'a, O, P>(parser: P, input: &'a str, property: &str) -> Result<O, StyleParseError>
where
    P: Parser<&'a str, Output = O, Error = NomError<&'a str>>,
{
    all_consuming(ws(parser))
        .parse(input)
        .map(|(_, out)| out)
        .map_err(|_| StyleParseError::InvalidValue {
            property: property.to_string(),
            value: input.to_string(),
        })
}

// --- Page Parsers ---

fn parse_series(input: &str) -> IResult<&str, PaperSeries> {
    alt((
        value(PaperSeries::A, tag_no_case("a")),
        value(PaperSeries::B, tag_no_case("b")),
    ))
    .parse(input)
}

/// Parses an ISO 216 paper name such as `a4` or `B10`.
pub fn parse_page_size(input: &str) -> IResult<&str, PageSize> {
    map_res(
        (parse_series, map_res(digit1, |d: &str| d.parse::<u8>())),
        |(series, number)| PageSize::new(series, number).ok_or("paper number out of range"),
    )
    .parse(input)
}

/// Parses `left,right,top,bottom` margins in points.
pub fn parse_page_margins(input: &str) -> IResult<&str, PageMargins> {
    map(
        (
            ws(parse_u32),
            char(','),
            ws(parse_u32),
            char(','),
            ws(parse_u32),
            char(','),
            ws(parse_u32),
        ),
        |(left, _, right, _, top, _, bottom)| PageMargins {
            left: left as f32,
            right: right as f32,
            top: top as f32,
            bottom: bottom as f32,
        },
    )
    .parse(input)
}

// --- Text Parsers ---

/// Parses a length in points, with an optional `pt` suffix.
pub fn parse_points(input: &str) -> IResult<&str, f32> {
    terminated(float, opt(tag_no_case("pt"))).parse(input)
}

pub fn parse_font_family(input: &str) -> IResult<&str, FontFamily> {
    alt((
        value(FontFamily::Sans, tag_no_case("sans-serif")),
        value(FontFamily::Sans, tag_no_case("heiti")),
        value(FontFamily::Sans, tag_no_case("hei")),
        value(FontFamily::Sans, tag_no_case("sans")),
        value(FontFamily::Serif, tag_no_case("songti")),
        value(FontFamily::Serif, tag_no_case("song")),
        value(FontFamily::Serif, tag_no_case("serif")),
    ))
    .parse(input)
}

pub fn parse_text_align(input: &str) -> IResult<&str, TextAlign> {
    alt((
        value(TextAlign::Left, tag_no_case("left")),
        value(TextAlign::Center, tag_no_case("center")),
        value(TextAlign::Right, tag_no_case("right")),
        value(TextAlign::Justified, tag_no_case("justified")),
        value(TextAlign::Justified, tag_no_case("justify")),
    ))
    .parse(input)
}
