use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Log file to analyze
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON field to match (structured logs)
    #[arg(long)]
    pub field: Option<String>,

    /// Value the field must equal
    #[arg(long)]
    pub value: Option<String>,

    /// Regex to match instead of a field/value pair (plain-text logs)
    #[arg(long, conflicts_with_all = ["field", "value"])]
    pub pattern: Option<String>,

    /// Number of parallel workers
    #[arg(long, default_value_t = num_cpus::get() as u32)]
    pub workers: u32,

    /// Per-range scan timeout, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        CliOptions::command().debug_assert();
    }

    #[test]
    fn parses_minimal_invocation() {
        let opts = CliOptions::parse_from(["logsift", "--input", "server.log"]);
        assert_eq!(opts.input, PathBuf::from("server.log"));
        assert!(opts.workers >= 1);
        assert!(opts.pattern.is_none());
    }

    #[test]
    fn pattern_conflicts_with_field() {
        let result = CliOptions::try_parse_from([
            "logsift",
            "--input",
            "server.log",
            "--pattern",
            "500",
            "--field",
            "error_code",
        ]);
        assert!(result.is_err());
    }
}
