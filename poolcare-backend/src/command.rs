use poolcare_common::{Chemical, Measurements};

/// Errors raised while parsing command-line arguments
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument '{0}': {1}")]
    InvalidArgument(String, String),
}

/// Fields accepted by `record` and `check`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingArgs {
    pub measurements: Measurements,
    /// ISO-8601 timestamp; defaults to now
    pub at: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Record(ReadingArgs),
    Check(ReadingArgs),
    Status,
    Adjust,
    Trend(Chemical),
    History(usize),
    Delete(String),
    Export(Option<String>),
    Import { path: String, replace: bool },
    ImportCsv(String),
    Migrate { from: String, to: String, keys: Vec<String> },
    Sweep,
    Help,
}

/// Default number of readings shown by `history`
pub const DEFAULT_HISTORY_COUNT: usize = 10;

impl Command {
    /// Parse arguments after the program name
    ///
    /// # Examples
    /// ```
    /// use poolcare_backend::command::Command;
    /// let cmd = Command::parse(&["trend".to_string(), "ph".to_string()]).unwrap();
    /// assert_eq!(cmd, Command::Trend(poolcare_common::Chemical::Ph));
    /// ```
    pub fn parse(args: &[String]) -> Result<Self, CommandError> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match name.to_lowercase().as_str() {
            "record" | "add" => Ok(Command::Record(parse_reading_args(rest)?)),
            "check" | "validate" => Ok(Command::Check(parse_reading_args(rest)?)),
            "status" => Ok(Command::Status),
            "adjust" => Ok(Command::Adjust),
            "trend" => {
                let chemical = rest.first().ok_or(CommandError::MissingArgument("chemical"))?;
                chemical
                    .parse::<Chemical>()
                    .map(Command::Trend)
                    .map_err(|e| CommandError::InvalidArgument(chemical.clone(), e))
            }
            "history" => match rest.first() {
                Some(count) => count
                    .parse::<usize>()
                    .map(Command::History)
                    .map_err(|e| CommandError::InvalidArgument(count.clone(), e.to_string())),
                None => Ok(Command::History(DEFAULT_HISTORY_COUNT)),
            },
            "delete" => rest
                .first()
                .map(|id| Command::Delete(id.clone()))
                .ok_or(CommandError::MissingArgument("id")),
            "export" => Ok(Command::Export(rest.first().cloned())),
            "import" => {
                let replace = rest.iter().any(|arg| arg == "--replace");
                let path = rest
                    .iter()
                    .find(|arg| !arg.starts_with("--"))
                    .ok_or(CommandError::MissingArgument("file"))?;
                Ok(Command::Import {
                    path: path.clone(),
                    replace,
                })
            }
            "import-csv" => rest
                .first()
                .map(|path| Command::ImportCsv(path.clone()))
                .ok_or(CommandError::MissingArgument("file")),
            "migrate" => {
                let from = rest.first().ok_or(CommandError::MissingArgument("from-namespace"))?;
                let to = rest.get(1).ok_or(CommandError::MissingArgument("to-namespace"))?;
                Ok(Command::Migrate {
                    from: from.clone(),
                    to: to.clone(),
                    keys: rest[2..].to_vec(),
                })
            }
            "sweep" => Ok(Command::Sweep),
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Parse `key=value` pairs such as `chlorine=1.5 ph=7.4 notes="after rain"`
fn parse_reading_args(args: &[String]) -> Result<ReadingArgs, CommandError> {
    let mut parsed = ReadingArgs::default();

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| CommandError::InvalidArgument(arg.clone(), "expected key=value".to_string()))?;
        let value = value.trim().trim_matches('"');

        match key.trim().to_lowercase().as_str() {
            "at" | "timestamp" => parsed.at = Some(value.to_string()),
            "notes" | "note" => parsed.notes = Some(value.to_string()),
            field => {
                let chemical = field
                    .parse::<Chemical>()
                    .map_err(|e| CommandError::InvalidArgument(arg.clone(), e))?;
                let number = value
                    .parse::<f64>()
                    .map_err(|e| CommandError::InvalidArgument(arg.clone(), e.to_string()))?;
                parsed.measurements.set(chemical, Some(number));
            }
        }
    }

    Ok(parsed)
}

pub const HELP_TEXT: &str = "\
Usage: poolcare <command> [args]

Commands:
  record k=v...                 Validate and store a reading
                                (chlorine, ph, alkalinity, temperature, at, notes)
  check k=v...                  Validate a partial reading without storing it
  status                        Status of the latest reading
  adjust                        Suggested adjustments for the latest reading
  trend <chemical>              Trend between the two latest readings
  history [n]                   Latest n readings (default 10)
  delete <id>                   Delete a reading
  export [namespace]            Print a namespace as JSON (default: readings)
  import <file> [--replace]     Import readings exported as JSON
  import-csv <file>             Import readings from CSV
  migrate <from> <to> [keys...] Copy entries between namespaces
  sweep                         Evict expired cache entries
  help                          Show this message";
