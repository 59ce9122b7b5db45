//! Command-line parsing.

use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str = "\
usage: inkboard [--config <file>] <command>

commands:
  render <document.json> <out.png> [--font <file.ttf>]
  import <image> <out.json>
  summary <document.json>
  export <document.json> [--dir <directory>] [--font <file.ttf>]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("option {0} needs a value")]
    MissingValue(String),
    #[error("unexpected argument `{0}`")]
    Unexpected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Render {
        document: PathBuf,
        output: PathBuf,
        font: Option<PathBuf>,
    },
    Import {
        image: PathBuf,
        output: PathBuf,
    },
    Summary {
        document: PathBuf,
    },
    Export {
        document: PathBuf,
        dir: Option<PathBuf>,
        font: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub command: Command,
}

/// Positional arguments plus `--name value` options, in any order.
#[derive(Default)]
struct Args {
    positional: Vec<String>,
    options: Vec<(String, String)>,
}

impl Args {
    fn split(args: impl IntoIterator<Item = String>) -> Result<Self, UsageError> {
        let mut out = Self::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if arg.starts_with("--") {
                let value = iter.next().ok_or_else(|| UsageError::MissingValue(arg.clone()))?;
                out.options.push((arg, value));
            } else {
                out.positional.push(arg);
            }
        }
        Ok(out)
    }

    fn take_option(&mut self, name: &str) -> Option<PathBuf> {
        let index = self.options.iter().position(|(n, _)| n == name)?;
        Some(PathBuf::from(self.options.remove(index).1))
    }

    fn next_positional(&mut self, what: &'static str) -> Result<PathBuf, UsageError> {
        if self.positional.is_empty() {
            return Err(UsageError::MissingArgument(what));
        }
        Ok(PathBuf::from(self.positional.remove(0)))
    }

    fn finish(self) -> Result<(), UsageError> {
        if let Some(extra) = self.positional.into_iter().next() {
            return Err(UsageError::Unexpected(extra));
        }
        if let Some((name, _)) = self.options.into_iter().next() {
            return Err(UsageError::Unexpected(name));
        }
        Ok(())
    }
}

impl Cli {
    /// Parse arguments, not including the program name.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, UsageError> {
        let mut args = Args::split(args)?;
        let config = args.take_option("--config");
        if args.positional.is_empty() {
            return Err(UsageError::MissingCommand);
        }
        let name = args.positional.remove(0);
        let command = match name.as_str() {
            "render" => Command::Render {
                document: args.next_positional("document path")?,
                output: args.next_positional("output path")?,
                font: args.take_option("--font"),
            },
            "import" => Command::Import {
                image: args.next_positional("image path")?,
                output: args.next_positional("output path")?,
            },
            "summary" => Command::Summary {
                document: args.next_positional("document path")?,
            },
            "export" => Command::Export {
                document: args.next_positional("document path")?,
                dir: args.take_option("--dir"),
                font: args.take_option("--font"),
            },
            _ => return Err(UsageError::UnknownCommand(name)),
        };
        args.finish()?;
        Ok(Self { config, command })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, UsageError> {
        Cli::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_render_with_options() {
        let cli = parse(&["--config", "ink.json", "render", "a.json", "a.png", "--font", "f.ttf"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ink.json")));
        assert_eq!(
            cli.command,
            Command::Render {
                document: "a.json".into(),
                output: "a.png".into(),
                font: Some("f.ttf".into()),
            }
        );
    }

    #[test]
    fn test_parse_summary_and_export() {
        assert_eq!(
            parse(&["summary", "doc.json"]).unwrap().command,
            Command::Summary { document: "doc.json".into() }
        );
        assert_eq!(
            parse(&["export", "doc.json"]).unwrap().command,
            Command::Export {
                document: "doc.json".into(),
                dir: None,
                font: None,
            }
        );
    }

    #[test]
    fn test_usage_errors() {
        assert_eq!(parse(&[]), Err(UsageError::MissingCommand));
        assert_eq!(parse(&["paint"]), Err(UsageError::UnknownCommand("paint".into())));
        assert_eq!(parse(&["import", "a.png"]), Err(UsageError::MissingArgument("output path")));
        assert_eq!(parse(&["summary", "a", "b"]), Err(UsageError::Unexpected("b".into())));
        assert_eq!(parse(&["summary", "a", "--dir"]), Err(UsageError::MissingValue("--dir".into())));
        assert_eq!(
            parse(&["summary", "a", "--font", "x"]),
            Err(UsageError::Unexpected("--font".into()))
        );
    }
}
