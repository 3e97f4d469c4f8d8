use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use clap::{crate_description, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::app::error::RuntimeError;

/// Option to set the directory previews are written to
pub const OPTION_EXPORT_PATH: &str = "export-path";
/// Option to set the output format
pub const OPTION_FORMAT: &str = "format";
/// Option to stop at the first input that cannot be previewed
pub const OPTION_FAIL_FAST: &str = "fail-fast";
/// The positional input files
pub const OPTION_PATHS: &str = "paths";

/// Formats the exporter can emit
pub const SUPPORTED_FILE_TYPES: &str = "txt, ndjson";

/// Output format for rendered previews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    /// The rendered preview text
    Txt,
    /// One JSON object per input
    Ndjson,
}

impl ExportType {
    /// Parse the command line value
    pub fn from_cli(format: &str) -> Option<Self> {
        match format.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "ndjson" => Some(Self::Ndjson),
            _ => None,
        }
    }
}

impl Display for ExportType {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportType::Txt => write!(fmt, "txt"),
            ExportType::Ndjson => write!(fmt, "ndjson"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Files to preview, in command line order
    pub paths: Vec<PathBuf>,
    /// Where previews are written; stdout when unset
    pub export_path: Option<PathBuf>,
    /// The output format
    pub export_type: ExportType,
    /// If true, stop at the first failing input
    pub fail_fast: bool,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let paths: Vec<PathBuf> = args
            .get_many::<PathBuf>(OPTION_PATHS)
            .map(|paths| paths.cloned().collect())
            .unwrap_or_default();
        let export_path = args.get_one::<PathBuf>(OPTION_EXPORT_PATH).cloned();
        let format = args.get_one::<String>(OPTION_FORMAT);
        let fail_fast = args.get_flag(OPTION_FAIL_FAST);

        if paths.is_empty() {
            return Err(RuntimeError::InvalidOptions(
                "No input files provided".to_string(),
            ));
        }

        let export_type = match format {
            Some(format) => ExportType::from_cli(format).ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "{format} is not a valid export type! Must be one of <{SUPPORTED_FILE_TYPES}>"
                ))
            })?,
            None => ExportType::Txt,
        };

        if let Some(export_path) = &export_path {
            if export_path.exists() && !export_path.is_dir() {
                return Err(RuntimeError::InvalidOptions(format!(
                    "Export path {} exists and is not a directory!",
                    export_path.display()
                )));
            }
        }

        Ok(Options {
            paths,
            export_path,
            export_type,
            fail_fast,
        })
    }
}

/// Build the command line parser
pub fn get_command() -> Command {
    Command::new("bplist-exporter")
        .version(crate_version!())
        .about(crate_description!())
        .arg_required_else_help(true)
        .arg(
            Arg::new(OPTION_PATHS)
                .help("Binary property list files to preview, optionally gzip or xz compressed")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new(OPTION_EXPORT_PATH)
                .short('o')
                .long(OPTION_EXPORT_PATH)
                .help(concat!(
                    "Write previews to this directory instead of stdout\n",
                    "The directory is created if it does not exist\n"
                ))
                .value_name("path/to/export/directory")
                .value_parser(value_parser!(PathBuf))
                .display_order(1),
        )
        .arg(
            Arg::new(OPTION_FORMAT)
                .short('f')
                .long(OPTION_FORMAT)
                .help("Specify a single file format to export previews into\n")
                .value_name(SUPPORTED_FILE_TYPES)
                .default_value("txt")
                .display_order(2),
        )
        .arg(
            Arg::new(OPTION_FAIL_FAST)
                .short('x')
                .long(OPTION_FAIL_FAST)
                .help("Stop at the first input that cannot be previewed\n")
                .action(ArgAction::SetTrue)
                .display_order(3),
        )
}

/// Parse arguments from the command line
pub fn from_command_line() -> ArgMatches {
    get_command().get_matches()
}

#[cfg(test)]
mod arg_tests {
    use std::path::PathBuf;

    use crate::app::{
        error::RuntimeError,
        options::{get_command, ExportType, Options},
    };

    fn parse(args: &[&str]) -> Result<Options, RuntimeError> {
        let matches = get_command()
            .try_get_matches_from(std::iter::once("bplist-exporter").chain(args.iter().copied()))
            .unwrap();
        Options::from_args(&matches)
    }

    #[test]
    fn can_build_defaults() {
        let options = parse(&["a.bplist"]).unwrap();

        assert_eq!(
            options,
            Options {
                paths: vec![PathBuf::from("a.bplist")],
                export_path: None,
                export_type: ExportType::Txt,
                fail_fast: false,
            }
        );
    }

    #[test]
    fn can_build_all_options() {
        let options = parse(&["-o", "out", "-f", "NDJSON", "-x", "a", "b"]).unwrap();

        assert_eq!(
            options,
            Options {
                paths: vec![PathBuf::from("a"), PathBuf::from("b")],
                export_path: Some(PathBuf::from("out")),
                export_type: ExportType::Ndjson,
                fail_fast: true,
            }
        );
    }

    #[test]
    fn cant_build_bad_format() {
        let result = parse(&["-f", "html", "a"]);
        assert!(matches!(result, Err(RuntimeError::InvalidOptions(_))));
    }

    #[test]
    fn cant_build_export_path_to_file() {
        let name = format!("bplist-exporter-options-{}", std::process::id());
        let file = std::env::temp_dir().join(name);
        std::fs::write(&file, b"").unwrap();

        let result = parse(&["-o", file.to_str().unwrap(), "a"]);
        std::fs::remove_file(&file).unwrap();

        assert!(matches!(result, Err(RuntimeError::InvalidOptions(_))));
    }

    #[test]
    fn cant_parse_without_paths() {
        assert!(get_command()
            .try_get_matches_from(["bplist-exporter", "-f", "txt"])
            .is_err());
    }

    #[test]
    fn can_display_export_type() {
        assert_eq!(ExportType::Txt.to_string(), "txt");
        assert_eq!(ExportType::from_cli("Txt"), Some(ExportType::Txt));
        assert_eq!(ExportType::from_cli("pdf"), None);
    }
}
