//! dashopt - run the option parser over a JSON-declared option table.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dashopt::{
    parse_args, write_report, write_summary, write_usage, Palette, SlotStorage, TableConfig,
};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

/// Table-driven option parsing with +flag negation.
#[derive(Parser, Debug)]
#[command(name = "dashopt", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the option table comes from.
#[derive(Args, Debug)]
struct TableSource {
    /// JSON option table
    #[arg(long, conflicts_with = "table_file", required_unless_present = "table_file")]
    table: Option<String>,

    /// File containing the JSON option table
    #[arg(long)]
    table_file: Option<PathBuf>,
}

impl TableSource {
    fn load(&self) -> Result<TableConfig> {
        let config = match (&self.table, &self.table_file) {
            (Some(json), _) => TableConfig::from_json(json).context("failed to parse table JSON")?,
            (None, Some(path)) => TableConfig::from_file(path)
                .with_context(|| format!("failed to load table from {}", path.display()))?,
            (None, None) => TableConfig::default(),
        };
        config.validate().context("invalid option table")?;
        Ok(config)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn palette(self, is_terminal: bool) -> Palette {
        match self {
            ColorChoice::Always => Palette::colored(),
            ColorChoice::Auto if is_terminal => Palette::colored(),
            ColorChoice::Auto | ColorChoice::Never => Palette::plain(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One line per option
    Summary,
    /// JSON object with options and positionals
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments against the table and print the result
    Parse {
        #[command(flatten)]
        source: TableSource,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Summary)]
        format: Format,

        /// When to color the output
        #[arg(long, value_enum, env = "DASHOPT_COLOR", default_value_t = ColorChoice::Auto)]
        color: ColorChoice,

        /// Program name followed by the arguments to parse
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print usage text for the table
    Usage {
        #[command(flatten)]
        source: TableSource,

        /// Program name shown on the usage line
        #[arg(long, default_value = "PROGRAM")]
        program: String,

        /// When to color the output
        #[arg(long, value_enum, env = "DASHOPT_COLOR", default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },
}

fn print_usage<W: Write + ?Sized>(
    out: &mut W,
    config: &TableConfig,
    program: &str,
    table: &dashopt::OptionTable<'_>,
    palette: &Palette,
) -> io::Result<()> {
    let header = config.header.as_deref().unwrap_or(program);
    let footer = config.footer.as_deref().unwrap_or("");
    write_usage(out, program, header, footer, &config.required, table, palette)
}

fn run_parse(source: &TableSource, format: Format, color: ColorChoice, args: Vec<String>) -> Result<()> {
    let config = source.load()?;
    let storage = SlotStorage::for_config(&config);
    let table = config.bind(&storage).context("failed to build option table")?;

    let program = args
        .first()
        .cloned()
        .context("missing program name after --")?;

    let positionals = match parse_args(&table, args) {
        Ok(positionals) => positionals,
        Err(err) => {
            let mut stderr = io::stderr().lock();
            let palette = color.palette(stderr.is_terminal());
            writeln!(stderr, "Invalid arguments")?;
            print_usage(&mut stderr, &config, &program, &table, &palette)?;
            return Err(err).context("failed to parse arguments");
        }
    };

    let mut stdout = io::stdout().lock();
    let palette = color.palette(stdout.is_terminal());

    if storage.flag("help") == Some(true) {
        print_usage(&mut stdout, &config, &program, &table, &palette)?;
        return Ok(());
    }

    match format {
        Format::Summary => write_summary(&mut stdout, &table, &positionals, &palette)?,
        Format::Json => write_report(&mut stdout, &storage, &positionals)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            source,
            format,
            color,
            args,
        } => run_parse(&source, format, color, args)?,
        Commands::Usage {
            source,
            program,
            color,
        } => {
            let config = source.load()?;
            let storage = SlotStorage::for_config(&config);
            let table = config.bind(&storage).context("failed to build option table")?;

            let mut stdout = io::stdout().lock();
            let palette = color.palette(stdout.is_terminal());
            print_usage(&mut stdout, &config, &program, &table, &palette)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const TABLE: &str = r#"{"options":[{"short":"i","long":"interactive"}]}"#;

    #[test]
    fn test_parse_subcommand_parses_table() {
        let cli = Cli::try_parse_from(["dashopt", "parse", "--table", TABLE, "--"]).unwrap();

        match cli.command {
            Commands::Parse {
                source,
                format,
                args,
                ..
            } => {
                assert_eq!(source.table.as_deref(), Some(TABLE));
                assert!(source.table_file.is_none());
                assert_eq!(format, Format::Summary);
                assert!(args.is_empty());
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_parse_subcommand_parses_args() {
        let cli = Cli::try_parse_from([
            "dashopt", "parse", "--table", TABLE, "--format", "json", "--", "sh", "-i", "+a",
            "--command=ls", "file",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse { format, args, .. } => {
                assert_eq!(format, Format::Json);
                assert_eq!(args, vec!["sh", "-i", "+a", "--command=ls", "file"]);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_parse_subcommand_requires_table() {
        let result = Cli::try_parse_from(["dashopt", "parse", "--"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_table_sources_conflict() {
        let result = Cli::try_parse_from([
            "dashopt",
            "parse",
            "--table",
            TABLE,
            "--table-file",
            "table.json",
            "--",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_usage_subcommand() {
        let cli = Cli::try_parse_from([
            "dashopt",
            "usage",
            "--table-file",
            "table.json",
            "--program",
            "sh",
            "--color",
            "never",
        ])
        .unwrap();

        match cli.command {
            Commands::Usage {
                source,
                program,
                color,
            } => {
                assert_eq!(source.table_file, Some(PathBuf::from("table.json")));
                assert_eq!(program, "sh");
                assert_eq!(color, ColorChoice::Never);
            }
            _ => panic!("Expected Usage command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["dashopt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_color_choice_palette() {
        assert_eq!(ColorChoice::Always.palette(false), Palette::colored());
        assert_eq!(ColorChoice::Never.palette(true), Palette::plain());
        assert_eq!(ColorChoice::Auto.palette(true), Palette::colored());
        assert_eq!(ColorChoice::Auto.palette(false), Palette::plain());
    }

    #[test]
    fn test_table_source_load_validates() {
        let source = TableSource {
            table: Some(r#"{"options":[{"help":"no name"}]}"#.to_string()),
            table_file: None,
        };
        assert!(source.load().is_err());

        let source = TableSource {
            table: Some(TABLE.to_string()),
            table_file: None,
        };
        assert_eq!(source.load().unwrap().options.len(), 1);
    }
}
