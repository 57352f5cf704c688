//! Usage text for an option table.

use crate::table::{ArgPolicy, OptionDescriptor, OptionTable};
use clap::builder::styling::{AnsiColor, Color, Style};
use std::io::{self, Write};

/// Placeholder shown for value options that don't name their value.
const DEFAULT_VALUE_NAME: &str = "value";

/// Default wrap column for descriptions.
pub const DEFAULT_WIDTH: usize = 80;

/// Styles used when writing usage and summary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Value placeholders and string values
    pub value: Style,
    /// Flags that are set
    pub set: Style,
    /// Flags that are not set
    pub unset: Style,
    /// Wrap column for descriptions
    pub width: usize,
}

impl Palette {
    /// ANSI colors: blue values, green/red flags.
    pub fn colored() -> Self {
        Self {
            value: fg(AnsiColor::Blue),
            set: fg(AnsiColor::Green),
            unset: fg(AnsiColor::Red),
            width: DEFAULT_WIDTH,
        }
    }

    /// No escape codes at all.
    pub fn plain() -> Self {
        Self {
            value: Style::new(),
            set: Style::new(),
            unset: Style::new(),
            width: DEFAULT_WIDTH,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Wrap `text` in `style`.
    pub fn paint(&self, style: Style, text: &str) -> String {
        format!("{}{}{}", style.render(), text, style.render_reset())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}

fn fg(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

fn value_name<'d>(option: &'d OptionDescriptor<'_>) -> &'d str {
    option.value_name.as_deref().unwrap_or(DEFAULT_VALUE_NAME)
}

/// Visible width of the option column for one entry.
fn entry_width(option: &OptionDescriptor<'_>) -> usize {
    let mut width = 0;
    if option.short.is_some() && option.long.is_some() {
        width += 2;
    }
    if option.short.is_some() {
        width += 2;
        if option.negatable {
            width += 3;
        }
    }
    if let Some(ref long) = option.long {
        width += 2 + long.chars().count();
    }
    if option.policy() == ArgPolicy::Optional {
        width += 2;
    }
    if option.takes_value() {
        width += value_name(option).chars().count();
    }
    width
}

/// Column at which descriptions start, minus one.
fn print_spacing(table: &OptionTable<'_>) -> usize {
    table
        .iter()
        .map(|option| entry_width(option) + 8)
        .max()
        .unwrap_or(0)
}

/// Write the full usage text.
///
/// `required` lists placeholders for positionals the program expects; they
/// are shown after `[options]` on the usage line.
pub fn write_usage<W, S>(
    out: &mut W,
    program: &str,
    header: &str,
    footer: &str,
    required: &[S],
    table: &OptionTable<'_>,
    palette: &Palette,
) -> io::Result<()>
where
    W: Write + ?Sized,
    S: AsRef<str>,
{
    writeln!(out, "{}", header)?;
    write!(out, "Usage: {} [options]", program)?;
    for name in required {
        write!(out, " {}", name.as_ref())?;
    }
    writeln!(out)?;

    let spacing = print_spacing(table);
    for option in table {
        write_option(out, option, spacing, palette)?;
    }

    writeln!(out, "{}", footer)
}

fn write_option<W: Write + ?Sized>(
    out: &mut W,
    option: &OptionDescriptor<'_>,
    spacing: usize,
    palette: &Palette,
) -> io::Result<()> {
    write!(out, "  ")?;

    if let Some(short) = option.short {
        write!(out, "-{}", short)?;
        if option.negatable {
            write!(out, "/+{}", short)?;
        }
        if option.long.is_some() {
            write!(out, ", ")?;
        }
    }
    if let Some(ref long) = option.long {
        write!(out, "--{}", long)?;
    }

    write!(out, " ")?;
    match option.policy() {
        ArgPolicy::None => {}
        ArgPolicy::Optional => {
            write!(out, "[{}]", palette.paint(palette.value, value_name(option)))?
        }
        ArgPolicy::Required => write!(out, "{}", palette.paint(palette.value, value_name(option)))?,
    }
    write!(out, "  ")?;

    let used = entry_width(option) + 4;
    write!(out, "{:pad$}", "", pad = spacing.saturating_sub(used))?;

    if let Some(ref description) = option.description {
        write_description(out, description, option, spacing + 1, palette)?;
    }
    writeln!(out)
}

/// Write `text` starting at `column`, wrapping at the palette width.
/// Every `$` stands for the option's value name.
fn write_description<W: Write + ?Sized>(
    out: &mut W,
    text: &str,
    option: &OptionDescriptor<'_>,
    column: usize,
    palette: &Palette,
) -> io::Result<()> {
    let placeholder = option.value_name.as_deref();
    let mut cursor = column;
    let mut first = true;

    for word in text.split_whitespace() {
        let visible = match placeholder {
            Some(name) => {
                word.chars().count() + word.matches('$').count() * name.chars().count()
                    - word.matches('$').count()
            }
            None => word.chars().count(),
        };

        if !first {
            if cursor + 1 + visible > palette.width {
                writeln!(out)?;
                write!(out, "{:column$}", "")?;
                cursor = column;
            } else {
                write!(out, " ")?;
                cursor += 1;
            }
        }

        match placeholder {
            Some(name) => {
                let painted = palette.paint(palette.value, name);
                write!(out, "{}", word.replace('$', &painted))?;
            }
            None => write!(out, "{}", word)?,
        }
        cursor += visible;
        first = false;
    }

    Ok(())
}

/// Generate the usage text as a string.
pub fn generate_usage<S: AsRef<str>>(
    program: &str,
    header: &str,
    footer: &str,
    required: &[S],
    table: &OptionTable<'_>,
    palette: &Palette,
) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_usage(&mut buf, program, header, footer, required, table, palette);
    String::from_utf8_lossy(&buf).into_owned()
}
