//! Parser for comma-separated lists.
//!
//! Both the forwarding chain header (`X-Forwarded-For`) and the configuration
//! strings are plain comma-separated lists. Entries are not validated here,
//! only split and stripped of surrounding whitespace.

use nom::bytes::complete::take_while;
use nom::character::complete::{char, space0};
use nom::combinator::map;
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::{Finish, IResult, InputLength};

fn entry(v: &str) -> IResult<&str, &str> {
    map(take_while(|c: char| c != ','), str::trim)(v)
}

pub(crate) fn strip_whitespace<'v, F, O>(parser: F) -> impl FnMut(&'v str) -> IResult<&'v str, O>
where
    F: FnMut(&'v str) -> IResult<&'v str, O>,
{
    delimited(space0, parser, space0)
}

pub(crate) fn entries(v: &str) -> IResult<&str, Vec<&str>> {
    separated_list0(char(','), strip_whitespace(entry))(v)
}

/// Split a comma-separated list into its trimmed entries.
///
/// Empty entries are kept, so `"a,,b"` yields three entries. Callers
/// decide whether an empty entry is meaningful.
pub(crate) fn comma_list(value: &str) -> Vec<&str> {
    // `entry` accepts anything but a comma, so the whole input is always consumed.
    entries(value).no_tail().unwrap_or_default()
}

/// The first entry of a comma-separated list, trimmed.
pub(crate) fn first_entry(value: &str) -> Option<&str> {
    entry(value).finish().ok().map(|(_, first)| first)
}

pub(crate) trait NoTail<O, E> {
    fn no_tail(self) -> Result<O, E>;
}

impl<I, O> NoTail<O, nom::error::Error<I>> for IResult<I, O>
where
    I: InputLength,
{
    fn no_tail(self) -> Result<O, nom::error::Error<I>> {
        match self.finish() {
            Ok((i, o)) if i.input_len() == 0 => Ok(o),
            Ok((i, _)) => Err(nom::error::Error::new(i, nom::error::ErrorKind::Eof)),
            Err(e) => Err(e),
        }
    }
}
