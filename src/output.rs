//! Summaries of parsed option values.

use crate::config::{SlotCell, SlotStorage};
use crate::help::Palette;
use crate::table::{OptionDescriptor, OptionTable, Slot};
use serde_json::{json, Map, Value};
use std::io::{self, Write};

/// Width of the name column in the summary.
const NAME_WIDTH: usize = 35;

fn label(option: &OptionDescriptor<'_>) -> String {
    match (&option.long, option.short) {
        (Some(long), _) => long.clone(),
        (None, Some(short)) => short.to_string(),
        (None, None) => String::new(),
    }
}

/// Write one line per option with its current value, then the positionals.
pub fn write_summary<W, S>(
    out: &mut W,
    table: &OptionTable<'_>,
    positionals: &[S],
    palette: &Palette,
) -> io::Result<()>
where
    W: Write + ?Sized,
    S: AsRef<str>,
{
    for option in table {
        let name = label(option);
        match option.slot {
            Slot::Flag(cell) => {
                let value = if cell.get() {
                    palette.paint(palette.set, "True")
                } else {
                    palette.paint(palette.unset, "False")
                };
                writeln!(out, "{:<width$} = (bool) {}", name, value, width = NAME_WIDTH)?;
            }
            Slot::Value(cell, _) => {
                let value = match *cell.borrow() {
                    Some(ref bound) if option.negatable => {
                        let text = format!("{}{}", bound.prefix(), bound.value);
                        palette.paint(palette.value, &text)
                    }
                    Some(ref bound) => palette.paint(palette.value, &bound.value),
                    None => String::from("(null)"),
                };
                writeln!(out, "{:<width$} = (string) {}", name, value, width = NAME_WIDTH)?;
            }
        }
    }

    let remaining: Vec<&str> = positionals.iter().map(AsRef::as_ref).collect();
    writeln!(out, "Remaining arguments: {}", remaining.join(" "))
}

/// Generate the summary as a string.
pub fn generate_summary<S: AsRef<str>>(
    table: &OptionTable<'_>,
    positionals: &[S],
    palette: &Palette,
) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_summary(&mut buf, table, positionals, palette);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Build a JSON report of every slot in `storage` and the positionals.
///
/// Flags become booleans, unbound values `null`, bound values
/// `{"negated": .., "value": ..}`.
pub fn report<S: AsRef<str>>(storage: &SlotStorage, positionals: &[S]) -> Value {
    let mut options = Map::new();

    for (name, cell) in storage.iter() {
        let value = match cell {
            SlotCell::Flag(flag) => Value::Bool(flag.get()),
            SlotCell::Value(value) => match *value.borrow() {
                Some(ref bound) => json!(bound),
                None => Value::Null,
            },
        };
        options.insert(name.to_string(), value);
    }

    let positionals: Vec<&str> = positionals.iter().map(AsRef::as_ref).collect();
    json!({
        "options": options,
        "positionals": positionals,
    })
}

/// Write the JSON report, pretty-printed, followed by a newline.
pub fn write_report<W, S>(out: &mut W, storage: &SlotStorage, positionals: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    serde_json::to_writer_pretty(&mut *out, &report(storage, positionals))?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::table::BoundValue;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_summary_plain() {
        let interactive = Cell::new(true);
        let export_all = Cell::new(false);
        let command = RefCell::new(Some(BoundValue::new(false, "echo hi")));
        let print_options = RefCell::new(Some(BoundValue::new(true, "vi")));
        let profile = RefCell::new(None);

        let table = OptionTable::new(vec![
            OptionDescriptor::flag(&interactive).short('i').long("interactive"),
            OptionDescriptor::flag(&export_all).short('a').negatable(),
            OptionDescriptor::required(&command).short('c').long("command"),
            OptionDescriptor::optional(&print_options).short('o').negatable(),
            OptionDescriptor::required(&profile).long("profile"),
        ]);

        let summary = generate_summary(&table, &["prog", "file.txt"], &Palette::plain());
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], format!("{:<35} = (bool) True", "interactive"));
        assert_eq!(lines[1], format!("{:<35} = (bool) False", "a"));
        assert_eq!(lines[2], format!("{:<35} = (string) echo hi", "command"));
        assert_eq!(lines[3], format!("{:<35} = (string) +vi", "o"));
        assert_eq!(lines[4], format!("{:<35} = (string) (null)", "profile"));
        assert_eq!(lines[5], "Remaining arguments: prog file.txt");
    }

    #[test]
    fn test_summary_colored() {
        let set = Cell::new(true);
        let unset = Cell::new(false);
        let table = OptionTable::new(vec![
            OptionDescriptor::flag(&set).short('x'),
            OptionDescriptor::flag(&unset).short('y'),
        ]);

        let summary = generate_summary(&table, &["prog"], &Palette::colored());
        assert!(summary.contains("(bool) \x1b[32mTrue\x1b[0m"));
        assert!(summary.contains("(bool) \x1b[31mFalse\x1b[0m"));
    }

    #[test]
    fn test_report() {
        let config = TableConfig::from_json(
            r#"{"options":[
                {"short":"i","long":"interactive"},
                {"short":"c","long":"command","arg":"required"},
                {"name":"print_options","short":"o","arg":"optional","negatable":true}
            ]}"#,
        )
        .unwrap();
        let storage = SlotStorage::for_config(&config);
        if let Some(SlotCell::Value(cell)) = storage.get("print_options") {
            *cell.borrow_mut() = Some(BoundValue::new(true, ""));
        }

        let value = report(&storage, &["prog", "x"]);
        assert_eq!(
            value,
            json!({
                "options": {
                    "interactive": false,
                    "command": null,
                    "print_options": {"negated": true, "value": ""}
                },
                "positionals": ["prog", "x"]
            })
        );
    }

    #[test]
    fn test_write_report_ends_with_newline() {
        let storage = SlotStorage::default();
        let mut buf = Vec::new();
        write_report(&mut buf, &storage, &["prog"]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["positionals"], json!(["prog"]));
    }
}
