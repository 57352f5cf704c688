//! The option parser.
//!
//! One forward pass over the tokens. Options are bound into the table's slots
//! as they are seen; everything else is collected, in order, as positionals.
//! An option that still needs a value when its token ends is kept pending and
//! resolved by the next token.

use crate::matcher::{self, LongMatch};
use crate::table::{BoundValue, OptionTable, Slot, TableError, ValuePolicy};
use log::{debug, trace};
use std::cell::{Cell, RefCell};
use thiserror::Error;

/// Errors that can occur during option parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid option table: {0}")]
    InvalidTable(#[from] TableError),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option cannot be negated: {0}")]
    NegationNotAllowed(String),

    #[error("missing value for option: {0}")]
    MissingRequiredValue(String),

    #[error("empty value for option: {0}")]
    EmptyInlineValue(String),

    #[error("option does not take a value: {0}")]
    UnexpectedValue(String),

    #[error("option given more than once: {0}")]
    DuplicateBinding(String),
}

/// Result of parsing: the program name followed by the positionals.
pub type ParseResult = Result<Vec<String>, ParseError>;

/// Parse `args` (program name first) against `table`.
///
/// On success the slots referenced by `table` hold the parsed values and the
/// returned vector holds the program name followed by every positional token
/// in its original order. On failure every value bound during this call is
/// reset to `None`.
pub fn parse_args<I, S>(table: &OptionTable<'_>, args: I) -> ParseResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    table.validate()?;

    let mut tokens = args.into_iter().map(Into::into);
    let mut parser = Parser::new(table);

    match tokens.next() {
        Some(program) => parser.positionals.push(program),
        None => return Ok(Vec::new()),
    }

    match parser.run(tokens) {
        Ok(()) => {
            debug!("remaining arguments: {:?}", parser.positionals);
            Ok(parser.positionals)
        }
        Err(err) => {
            parser.rollback();
            debug!("parse failed: {}", err);
            Err(err)
        }
    }
}

/// Like [`parse_args`], but rewrites `args` to the program name and the
/// positionals. `args` is left untouched when parsing fails.
pub fn parse_in_place(table: &OptionTable<'_>, args: &mut Vec<String>) -> Result<(), ParseError> {
    let positionals = parse_args(table, args.iter().cloned())?;
    *args = positionals;
    Ok(())
}

/// A value slot together with how its option was spelled.
struct Target<'a> {
    cell: &'a RefCell<Option<BoundValue>>,
    policy: ValuePolicy,
    spelling: String,
}

/// An option waiting for the next token to supply its value.
struct Pending<'a> {
    target: Target<'a>,
    negated: bool,
}

/// Internal parser state.
struct Parser<'t, 'a> {
    table: &'t OptionTable<'a>,
    pending: Option<Pending<'a>>,
    /// Slots bound during this parse, reset if it fails.
    journal: Vec<&'a RefCell<Option<BoundValue>>>,
    positionals: Vec<String>,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(table: &'t OptionTable<'a>) -> Self {
        Self {
            table,
            pending: None,
            journal: Vec::new(),
            positionals: Vec::new(),
        }
    }

    fn run<I: Iterator<Item = String>>(&mut self, mut tokens: I) -> Result<(), ParseError> {
        while let Some(token) = tokens.next() {
            if let Some(pending) = self.pending.take() {
                if self.resolve_pending(pending, &token)? {
                    continue;
                }
            }

            trace!("token {:?}", token);

            if token == "--" {
                // End of options
                self.positionals.extend(tokens.by_ref());
                break;
            }

            if token == "-" || !(token.starts_with('-') || token.starts_with('+')) {
                self.positionals.push(token);
            } else if let Some(run) = token.strip_prefix('+') {
                self.short_run(run, true)?;
            } else if let Some(body) = token.strip_prefix("--") {
                self.long_option(body)?;
            } else {
                self.short_run(&token[1..], false)?;
            }
        }

        self.finish()
    }

    /// Feed `token` to the pending option. Returns whether it was consumed.
    fn resolve_pending(&mut self, pending: Pending<'a>, token: &str) -> Result<bool, ParseError> {
        let Pending { target, negated } = pending;

        if !token.starts_with('-') {
            self.bind(&target, negated, token)?;
            return Ok(true);
        }

        match target.policy {
            ValuePolicy::Required => Err(ParseError::MissingRequiredValue(target.spelling)),
            ValuePolicy::Optional => {
                self.bind(&target, negated, "")?;
                Ok(false)
            }
        }
    }

    /// Decode a cluster of short names following `-` or `+`.
    fn short_run(&mut self, run: &str, negated: bool) -> Result<(), ParseError> {
        let prefix = if negated { '+' } else { '-' };

        for (pos, name) in run.char_indices() {
            let option = matcher::find_short(self.table, name, negated)?;
            let spelling = format!("{}{}", prefix, name);

            let (cell, policy) = match option.slot {
                Slot::Flag(cell) => {
                    self.set_flag(cell, !negated, &spelling);
                    continue;
                }
                Slot::Value(cell, policy) => (cell, policy),
            };

            let target = Target {
                cell,
                policy,
                spelling,
            };
            let rest = &run[pos + name.len_utf8()..];

            if rest.is_empty() {
                self.pending = Some(Pending { target, negated });
                return Ok(());
            }

            match policy {
                // The rest of the token is the value
                ValuePolicy::Required => return self.bind(&target, negated, rest),
                ValuePolicy::Optional => self.bind(&target, negated, "")?,
            }
        }

        Ok(())
    }

    fn long_option(&mut self, body: &str) -> Result<(), ParseError> {
        match matcher::find_long(self.table, body)? {
            LongMatch::Bare(option) => {
                let spelling = format!("--{}", body);
                match option.slot {
                    Slot::Flag(cell) => self.set_flag(cell, true, &spelling),
                    Slot::Value(cell, policy) => {
                        self.pending = Some(Pending {
                            target: Target {
                                cell,
                                policy,
                                spelling,
                            },
                            negated: false,
                        });
                    }
                }
                Ok(())
            }
            LongMatch::Inline(option, value) => match option.slot {
                Slot::Value(cell, policy) => {
                    let target = Target {
                        cell,
                        policy,
                        spelling: option.display_name(),
                    };
                    self.bind(&target, false, value)
                }
                Slot::Flag(_) => Err(ParseError::UnexpectedValue(option.display_name())),
            },
        }
    }

    /// Settle an option still waiting when the tokens run out.
    fn finish(&mut self) -> Result<(), ParseError> {
        let Some(Pending { target, negated }) = self.pending.take() else {
            return Ok(());
        };

        match target.policy {
            ValuePolicy::Optional => self.bind(&target, negated, ""),
            ValuePolicy::Required => Err(ParseError::MissingRequiredValue(target.spelling)),
        }
    }

    fn set_flag(&mut self, cell: &Cell<bool>, value: bool, spelling: &str) {
        debug!("{} = {}", spelling, value);
        cell.set(value);
    }

    /// Every value binding goes through here.
    fn bind(&mut self, target: &Target<'a>, negated: bool, value: &str) -> Result<(), ParseError> {
        let mut slot = target.cell.borrow_mut();
        if slot.is_some() {
            return Err(ParseError::DuplicateBinding(target.spelling.clone()));
        }

        debug!("{} = {:?} (negated: {})", target.spelling, value, negated);
        *slot = Some(BoundValue::new(negated, value));
        self.journal.push(target.cell);
        Ok(())
    }

    fn rollback(&mut self) {
        if !self.journal.is_empty() {
            debug!("releasing {} bound value(s)", self.journal.len());
        }
        for cell in self.journal.drain(..) {
            *cell.borrow_mut() = None;
        }
    }
}
