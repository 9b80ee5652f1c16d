//! Redaction of personal data in log messages.
//!
//! Messages are expected to carry data as `field=value` pairs separated by a
//! separator character, e.g. `email=a@x.com;password=hunter2;`. The values of
//! selected fields are replaced before the message is written anywhere.

use std::io::Write;

use env_logger::{Builder, Target};
use log::{Level, LevelFilter, Record};
use regex::{Captures, Regex};

/// Fields which hold personally identifiable information, and are redacted
/// with `init_logger(&PII_FIELDS, ..)`.
pub const PII_FIELDS: [&str; 5] = ["name", "email", "ssn", "password", "credit_card"];

/// Replaces the values of the given fields in `field=value` pairs. A value
/// runs up to the next separator character, or the end of the line if the
/// separator is empty. Field names must start at a word boundary, so
/// `username=x` is not matched by the field `name`.
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Option<Regex>,
    redaction: String,
}

impl Redactor {
    pub fn new<F: AsRef<str>>(fields: &[F], redaction: &str, separator: &str) -> Result<Self, regex::Error> {
        if fields.is_empty() {
            return Ok(Self {pattern: None, redaction: redaction.to_string()});
        }

        let names = fields.iter()
            .map(|field| regex::escape(field.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        let value = if separator.is_empty() {
            ".*".to_string()
        } else {
            let excluded = separator.chars()
                .map(|c| regex::escape(&c.to_string()))
                .collect::<String>();
            format!("[^{excluded}]*")
        };

        let pattern = Regex::new(&format!(r"\b(?P<field>{names})={value}"))?;
        Ok(Self {pattern: Some(pattern), redaction: redaction.to_string()})
    }

    pub fn redact(&self, message: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return message.to_string();
        };

        pattern
            .replace_all(message, |caps: &Captures| format!("{}={}", &caps["field"], self.redaction))
            .into_owned()
    }
}

/// Returns the message with the values of the given fields replaced by
/// `redaction`. See `Redactor` for the matching rules; build a `Redactor`
/// instead when redacting many messages with the same fields.
pub fn filter_datum<F: AsRef<str>>(
    fields: &[F],
    redaction: &str,
    message: &str,
    separator: &str,
) -> Result<String, regex::Error> {
    Redactor::new(fields, redaction, separator)
        .map(|redactor| redactor.redact(message))
}

/// Formats log records as single lines, redacting the configured fields in
/// the message.
#[derive(Debug, Clone)]
pub struct RedactingFormatter {
    redactor: Redactor,
}

impl RedactingFormatter {
    pub const REDACTION: &'static str = "***";
    pub const SEPARATOR: &'static str = ";";

    pub fn new<F: AsRef<str>>(fields: &[F]) -> Result<Self, regex::Error> {
        let redactor = Redactor::new(fields, Self::REDACTION, Self::SEPARATOR)?;
        Ok(Self {redactor})
    }

    pub fn format(&self, record: &Record) -> String {
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S,%3f")
            .to_string();
        let message = record.args().to_string();

        self.format_line(record.target(), record.level(), &timestamp, &message)
    }

    fn format_line(&self, target: &str, level: Level, timestamp: &str, message: &str) -> String {
        format!("[AUTHSTORE] {target} {level} {timestamp}: {}", self.redactor.redact(message))
    }
}

/// Writes one redacted log line for a record. This is the format function
/// installed into the `env_logger` builder by `redacting_logger`.
pub fn write_record<W: Write>(formatter: &RedactingFormatter, buf: &mut W, record: &Record) -> std::io::Result<()> {
    writeln!(buf, "{}", formatter.format(record))
}

/// Builds an `env_logger` builder which writes redacted lines to stderr, for
/// every message at or above `level`.
pub fn redacting_logger(formatter: RedactingFormatter, level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format(move |buf, record| write_record(&formatter, buf, record))
        .target(Target::Stderr);
    builder
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid redaction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("logger already installed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Installs a global logger which redacts the given fields from every
/// message at or above `level`. Use `PII_FIELDS` for the usual set.
pub fn init_logger<F: AsRef<str>>(fields: &[F], level: LevelFilter) -> Result<(), InitError> {
    let formatter = RedactingFormatter::new(fields)?;
    redacting_logger(formatter, level).try_init()?;

    log::info!("Redacting logger initialized");
    Ok(())
}
