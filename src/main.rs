use iptables_log::config::{Config, ErrorPolicy};
use iptables_log::output::{self, Record};
use iptables_log::{parse, ParseError};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use structopt::StructOpt;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(StructOpt, Debug)]
#[structopt(name = "iptables-log")]
struct Opt {
    /// The path to the firewall logs
    #[structopt(short = "f", long = "file", parse(from_os_str))]
    file: PathBuf,

    /// TOML config file
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config: Option<PathBuf>,

    /// Year to assume for syslog timestamps
    #[structopt(long = "year")]
    year: Option<i32>,

    /// Stop at the first line that fails to parse
    #[structopt(long = "abort-on-error")]
    abort_on_error: bool,
}

#[derive(Debug, Default, PartialEq)]
struct Summary {
    parsed: usize,
    unmatched: usize,
    malformed: usize,
}

fn ingest_file(file: &Path, config: &Config) -> Result<Summary, Box<dyn Error>> {
    let input = BufReader::new(File::open(file)?);
    let stdout = io::stdout();
    ingest(input, stdout.lock(), config)
}

fn ingest(
    input: impl BufRead,
    mut out: impl Write,
    config: &Config,
) -> Result<Summary, Box<dyn Error>> {
    let mut summary = Summary::default();

    for (i, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let lineno = i + 1;

        let err = match parse(&line) {
            Ok(entry) => {
                let record = Record::new(&entry, config.year);
                writeln!(out, "{}", output::render(&record, config.format)?)?;
                summary.parsed += 1;
                continue;
            }
            Err(err) => err,
        };

        match &err {
            ParseError::FormatUnmatched => {
                debug!(line = lineno, "not a packet log line");
                summary.unmatched += 1;
            }
            ParseError::NumberConversion { field, .. } => {
                warn!(line = lineno, field = *field, error = %err, "malformed packet log line");
                summary.malformed += 1;
            }
        }
        if config.on_error == ErrorPolicy::Abort {
            return Err(format!("line {}: {}", lineno, err).into());
        }
    }

    out.flush()?;
    Ok(summary)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let opt = Opt::from_args();

    let mut config = match &opt.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(2);
            }
        },
        None => Config::default(),
    };
    if opt.year.is_some() {
        config.year = opt.year;
    }
    if opt.abort_on_error {
        config.on_error = ErrorPolicy::Abort;
    }

    init_tracing(&config.level);

    match ingest_file(&opt.file, &config) {
        Ok(summary) => info!(
            parsed = summary.parsed,
            unmatched = summary.unmatched,
            malformed = summary.malformed,
            "ingest finished"
        ),
        Err(e) => {
            error!("ingest failed with: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECHO: &str = "Jul 21 05:38:28 ubuntu-jammy kernel: [14879.600492] OUT-LOG: IN= OUT=enp0s3 SRC=10.0.2.15 DST=8.8.8.8 LEN=84 TOS=0x00 PREC=0x00 TTL=64 ID=6495 DF PROTO=ICMP TYPE=8 CODE=0 ID=1 SEQ=3";

    fn input() -> String {
        [
            ECHO.to_string(),
            "Jul 21 05:38:29 ubuntu-jammy sshd[42]: Accepted publickey".to_string(),
            ECHO.replace("LEN=84", "LEN=abc"),
            ECHO.to_string(),
        ]
        .join("\n")
    }

    fn config(on_error: ErrorPolicy) -> Config {
        Config {
            on_error,
            ..Config::default()
        }
    }

    #[test]
    fn skip_counts_failures_and_keeps_going() {
        let mut out = Vec::new();
        let summary = ingest(input().as_bytes(), &mut out, &config(ErrorPolicy::Skip)).unwrap();
        assert_eq!(
            summary,
            Summary {
                parsed: 2,
                unmatched: 1,
                malformed: 1,
            }
        );

        let written = String::from_utf8(out).unwrap();
        assert_eq!(written.lines().count(), 2);
        for line in written.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["protocol"], "ICMP");
        }
    }

    #[test]
    fn abort_stops_at_first_failure() {
        let mut out = Vec::new();
        let err = ingest(input().as_bytes(), &mut out, &config(ErrorPolicy::Abort)).unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let text = format!("\n{}\n   \n\n{}\n", ECHO, ECHO);
        let mut out = Vec::new();
        let summary = ingest(text.as_bytes(), &mut out, &config(ErrorPolicy::Abort)).unwrap();
        assert_eq!(
            summary,
            Summary {
                parsed: 2,
                unmatched: 0,
                malformed: 0,
            }
        );
    }
}
