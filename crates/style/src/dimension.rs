use crate::parsers::{StyleParseError, parse_page_margins, parse_page_size, parse_value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSeries {
    A,
    B,
}

// Portrait dimensions in points, indexed by paper number.
const A_SERIES: [(f32, f32); 11] = [
    (2384.0, 3370.0),
    (1684.0, 2384.0),
    (1191.0, 1684.0),
    (842.0, 1191.0),
    (595.0, 842.0),
    (420.0, 595.0),
    (297.0, 420.0),
    (210.0, 297.0),
    (148.0, 210.0),
    (105.0, 148.0),
    (74.0, 105.0),
];

const B_SERIES: [(f32, f32); 11] = [
    (2834.0, 4008.0),
    (2004.0, 2834.0),
    (1417.0, 2004.0),
    (1000.0, 1417.0),
    (708.0, 1000.0),
    (498.0, 708.0),
    (354.0, 498.0),
    (249.0, 354.0),
    (175.0, 249.0),
    (124.0, 175.0),
    (88.0, 124.0),
];

/// An ISO 216 paper size, A0 to A10 or B0 to B10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageSize {
    series: PaperSeries,
    number: u8,
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

impl PageSize {
    pub const A4: PageSize = PageSize { series: PaperSeries::A, number: 4 };

    pub fn new(series: PaperSeries, number: u8) -> Option<Self> {
        (number <= 10).then_some(Self { series, number })
    }

    pub fn series(&self) -> PaperSeries {
        self.series
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// `(width, height)` in points, portrait orientation.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let table = match self.series {
            PaperSeries::A => &A_SERIES,
            PaperSeries::B => &B_SERIES,
        };
        table[self.number as usize]
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.series {
            PaperSeries::A => 'A',
            PaperSeries::B => 'B',
        };
        write!(f, "{}{}", letter, self.number)
    }
}

impl FromStr for PageSize {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_value(parse_page_size, s, "page-size")
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl PageMargins {
    pub const DEFAULT_POINTS: f32 = 50.0;

    pub fn uniform(value: f32) -> Self {
        Self { left: value, right: value, top: value, bottom: value }
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(Self::DEFAULT_POINTS)
    }
}

impl FromStr for PageMargins {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_value(parse_page_margins, s, "page-margin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a4_portrait() {
        assert_eq!(PageSize::default().dimensions_pt(), (595.0, 842.0));
        assert_eq!(PageSize::default().to_string(), "A4");
    }

    #[test]
    fn b_series_lookup() {
        let b0: PageSize = "b0".parse().unwrap();
        assert_eq!(b0.dimensions_pt(), (2834.0, 4008.0));
        let a10: PageSize = "A10".parse().unwrap();
        assert_eq!(a10.dimensions_pt(), (74.0, 105.0));
    }

    #[test]
    fn unknown_size_is_an_error() {
        let err = "zz".parse::<PageSize>().unwrap_err();
        assert_eq!(
            err,
            StyleParseError::InvalidValue { property: "page-size".into(), value: "zz".into() }
        );
    }

    #[test]
    fn margins_default_to_fifty() {
        assert_eq!(PageMargins::default(), PageMargins::uniform(50.0));
        let m: PageMargins = "1,2,3,4".parse().unwrap();
        assert_eq!(m.bottom, 4.0);
    }
}
