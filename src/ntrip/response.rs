use nom::bytes::complete::take_till;
use nom::bytes::complete::take_while1;
use nom::character::complete::digit1;
use nom::character::complete::line_ending;
use nom::character::complete::space0;
use nom::character::complete::space1;
use nom::combinator::map_res;
use nom::combinator::opt;
use nom::error::VerboseError;
use nom::sequence::preceded;
use nom::IResult;

use std::fmt;
use std::str;

type Result<'a, T> = IResult<&'a [u8], T, VerboseError<&'a [u8]>>;

/// First line of a caster reply, `ICY 200 OK` or `HTTP/1.1 401 Unauthorized`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusLine {
    pub protocol: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    /// A 2xx reply that is not a source table listing.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code) && self.protocol != "SOURCETABLE"
    }

    /// HTTP replies carry header lines before the data, ICY replies do not.
    pub fn has_headers(&self) -> bool {
        self.protocol.starts_with("HTTP/")
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.protocol, self.code)?;

        if !self.reason.is_empty() {
            write!(f, " {}", self.reason)?;
        }

        Ok(())
    }
}

fn protocol(input: &[u8]) -> Result<String> {
    let (input, p) = take_while1(|c: u8| c.is_ascii_graphic())(input)?;

    Ok((input, String::from_utf8_lossy(p).into_owned()))
}

fn code(input: &[u8]) -> Result<u16> {
    map_res(digit1, |d: &[u8]| {
        str::from_utf8(d)
            .map_err(|_| ())
            .and_then(|d| d.parse::<u16>().map_err(|_| ()))
    })(input)
}

fn reason(input: &[u8]) -> Result<String> {
    let (input, r) = take_till(|c: u8| c == b'\r' || c == b'\n')(input)?;

    Ok((input, String::from_utf8_lossy(r).trim_end().to_string()))
}

pub(crate) fn status_line(input: &[u8]) -> Result<StatusLine> {
    let (input, protocol) = protocol(input)?;
    let (input, _) = space1(input)?;
    let (input, code) = code(input)?;
    let (input, reason) = opt(preceded(space1, reason))(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = line_ending(input)?;

    Ok((
        input,
        StatusLine {
            protocol,
            code,
            reason: reason.unwrap_or_default(),
        },
    ))
}
