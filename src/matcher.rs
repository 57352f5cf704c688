//! Name lookups used by the parser.
//!
//! These never write to a slot; the parser applies whatever they find so
//! that every binding goes through one place.

use crate::parser::ParseError;
use crate::table::{OptionDescriptor, OptionTable};
use std::cmp::Ordering;

/// Compare `pattern` against `candidate` up to `delimiter`.
///
/// Returns `Equal` when `candidate` is exactly `pattern`, or `pattern`
/// followed by `delimiter` and anything after it. The second element is the
/// byte offset in `candidate` where the comparison stopped, which for a match
/// is where the delimiter (if any) sits.
pub fn delimited_compare(pattern: &str, candidate: &str, delimiter: char) -> (Ordering, usize) {
    let mut rest = candidate.chars();
    let mut offset = 0;

    for p in pattern.chars() {
        match rest.next() {
            None if p == delimiter => return (Ordering::Equal, offset),
            None => return (Ordering::Greater, offset),
            Some(c) if c != p => return (p.cmp(&c), offset),
            Some(c) => offset += c.len_utf8(),
        }
    }

    match rest.next() {
        None => (Ordering::Equal, offset),
        Some(c) if c == delimiter => (Ordering::Equal, offset),
        Some(_) => (Ordering::Less, offset),
    }
}

/// Find the option for a short name.
///
/// `negated` is set when the name came from a `+` run; the option must then
/// allow negation.
pub fn find_short<'t, 'a>(
    table: &'t OptionTable<'a>,
    name: char,
    negated: bool,
) -> Result<&'t OptionDescriptor<'a>, ParseError> {
    let option = table
        .iter()
        .find(|o| o.short == Some(name))
        .ok_or_else(|| {
            let prefix = if negated { '+' } else { '-' };
            ParseError::UnknownOption(format!("{}{}", prefix, name))
        })?;

    if negated && !option.negatable {
        return Err(ParseError::NegationNotAllowed(format!("+{}", name)));
    }

    Ok(option)
}

/// Result of a long-name lookup.
#[derive(Debug)]
pub enum LongMatch<'t, 'a, 's> {
    /// `--name` on its own.
    Bare(&'t OptionDescriptor<'a>),
    /// `--name=value` on a value-bearing option.
    Inline(&'t OptionDescriptor<'a>, &'s str),
}

/// Find the option for the text following `--`.
pub fn find_long<'t, 'a, 's>(
    table: &'t OptionTable<'a>,
    body: &'s str,
) -> Result<LongMatch<'t, 'a, 's>, ParseError> {
    let mut flag_with_value = None;

    for option in table {
        let Some(ref long) = option.long else {
            continue;
        };

        if long == body {
            return Ok(LongMatch::Bare(option));
        }

        let (ordering, end) = delimited_compare(long, body, '=');
        if ordering != Ordering::Equal {
            continue;
        }

        if !option.takes_value() {
            flag_with_value.get_or_insert(long.as_str());
            continue;
        }

        let value = body[end..].strip_prefix('=').unwrap_or("");
        if value.is_empty() {
            return Err(ParseError::EmptyInlineValue(format!("--{}", long)));
        }
        return Ok(LongMatch::Inline(option, value));
    }

    match flag_with_value {
        Some(long) => Err(ParseError::UnexpectedValue(format!("--{}", long))),
        None => {
            let name = body.split('=').next().unwrap_or(body);
            Err(ParseError::UnknownOption(format!("--{}", name)))
        }
    }
}
