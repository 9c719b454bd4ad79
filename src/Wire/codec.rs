//! Text encoding of [`Message`]s, one message per line, fields separated by `|`.
//!
//! ```text
//! MESSAGE|READY|<processId>
//! COMMAND|<START|COUNT|STOP>
//! MESSAGE|COUNT|<processId>|<c0>,<c1>,...,<c9>|<total>
//! MESSAGE|LOG|<processId>|<threadId|->|<text>
//! ```
//!
//! [`decode`] separates three outcomes: a message, an unknown line
//! (`Ok(None)`, to be ignored) and a known kind with a malformed payload
//! (`Err`, to be reported and skipped).

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::Wire::Structs::{Command, DigitHistogram, Message, DIGITS};

const COMMAND: &str = "COMMAND";
const MESSAGE: &str = "MESSAGE";
const READY: &str = "READY";
const COUNT: &str = "COUNT";
const LOG: &str = "LOG";
const NO_THREAD: &str = "-";

/// Encode a message as a single line, without the trailing newline.
pub fn encode(message: &Message) -> String {
    message.to_string()
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Ready { process_id } => write!(f, "{MESSAGE}|{READY}|{process_id}"),
            Message::Command(cmd) => write!(f, "{COMMAND}|{}", cmd.as_str()),
            Message::Count {
                process_id,
                histogram,
            } => {
                write!(f, "{MESSAGE}|{COUNT}|{process_id}|")?;
                for (digit, count) in histogram.buckets().iter().enumerate() {
                    if digit > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{count}")?;
                }
                write!(f, "|{}", histogram.total())
            }
            Message::Log {
                process_id,
                thread_id,
                text,
            } => {
                write!(f, "{MESSAGE}|{LOG}|{process_id}|")?;
                match thread_id {
                    Some(id) => write!(f, "{id}|")?,
                    None => write!(f, "{NO_THREAD}|")?,
                }
                // a raw newline would split the message in two
                if text.contains(['\n', '\r']) {
                    f.write_str(&text.replace(['\n', '\r'], " "))
                } else {
                    f.write_str(text)
                }
            }
        }
    }
}

/// Decode one protocol line. Trailing `\r`/`\n` are ignored.
///
/// # Returns
/// * `Ok(Some(message))` for a well-formed line
/// * `Ok(None)` for a line whose prefix is not a known message kind
/// * `Err(DecodeError)` for a known kind with a malformed payload
pub fn decode(line: &str) -> Result<Option<Message>, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split('|').collect();

    match fields.as_slice() {
        [COMMAND, rest @ ..] => {
            expect_fields(COMMAND, &fields, 2)?;
            let cmd = Command::parse(rest[0])
                .ok_or_else(|| DecodeError::UnknownCommand(rest[0].to_string()))?;
            Ok(Some(Message::Command(cmd)))
        }
        [MESSAGE, READY, ..] => {
            expect_fields(READY, &fields, 3)?;
            let process_id = parse_number(READY, "processId", fields[2])?;
            Ok(Some(Message::Ready { process_id }))
        }
        [MESSAGE, COUNT, ..] => {
            expect_fields(COUNT, &fields, 5)?;
            let process_id = parse_number(COUNT, "processId", fields[2])?;
            let histogram = parse_histogram(fields[3])?;
            let declared: u64 = parse_number(COUNT, "total", fields[4])?;
            let actual = histogram.checked_total().ok_or(DecodeError::CountOverflow)?;
            if declared != actual {
                return Err(DecodeError::TotalMismatch { declared, actual });
            }
            Ok(Some(Message::Count {
                process_id,
                histogram,
            }))
        }
        [MESSAGE, LOG, ..] => {
            // the text is everything after the fourth separator and may contain '|'
            let parts: Vec<&str> = line.splitn(5, '|').collect();
            expect_fields(LOG, &parts, 5)?;
            let process_id = parse_number(LOG, "processId", parts[2])?;
            let thread_id = match parts[3] {
                NO_THREAD => None,
                raw => Some(parse_number(LOG, "threadId", raw)?),
            };
            Ok(Some(Message::Log {
                process_id,
                thread_id,
                text: parts[4].to_string(),
            }))
        }
        _ => Ok(None),
    }
}

fn expect_fields(kind: &'static str, fields: &[&str], expected: usize) -> Result<(), DecodeError> {
    if fields.len() != expected {
        return Err(DecodeError::FieldCount {
            kind,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn parse_number<N: FromStr>(
    kind: &'static str,
    field: &'static str,
    raw: &str,
) -> Result<N, DecodeError> {
    raw.parse().map_err(|_| DecodeError::InvalidNumber {
        kind,
        field,
        value: raw.to_string(),
    })
}

fn parse_histogram(raw: &str) -> Result<DigitHistogram, DecodeError> {
    let counts: Vec<&str> = raw.split(',').collect();
    if counts.len() != DIGITS {
        return Err(DecodeError::BucketCount {
            found: counts.len(),
        });
    }
    let mut buckets = [0u64; DIGITS];
    for (bucket, count) in buckets.iter_mut().zip(counts) {
        *bucket = parse_number(COUNT, "bucket", count)?;
    }
    Ok(DigitHistogram::from_buckets(buckets))
}
