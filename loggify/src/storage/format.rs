use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use log::Level;

use crate::models::error::CaptureError;

pub const DEFAULT_LINE_FORMAT: &str = "{asctime}.{msecs}:{name}:{message}";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    AscTime,
    Msecs,
    Name,
    LevelName,
    Message,
}

/// Pre-parsed record template.
///
/// Placeholders:
/// - `{asctime}`: timestamp rendered with the date format
/// - `{msecs}`: milliseconds part, zero-padded to 3 digits
/// - `{name}`: sink name
/// - `{levelname}`: `INFO`, `ERROR`, ...
/// - `{message}`: the line content
///
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    segments: Vec<Segment>,
    date_format: String,
}

impl LineFormat {
    pub fn parse(template: &str, date_format: &str) -> Result<Self, CaptureError> {
        if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
            return Err(CaptureError::InvalidFormat(format!(
                "invalid date format: {:?}",
                date_format
            )));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(CaptureError::InvalidFormat(format!(
                            "unterminated placeholder in {:?}",
                            template
                        )));
                    }
                    let segment = match name.as_str() {
                        "asctime" => Segment::AscTime,
                        "msecs" => Segment::Msecs,
                        "name" => Segment::Name,
                        "levelname" => Segment::LevelName,
                        "message" => Segment::Message,
                        other => {
                            return Err(CaptureError::InvalidFormat(format!(
                                "unknown placeholder {{{}}}",
                                other
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    return Err(CaptureError::InvalidFormat(format!(
                        "unmatched '}}' in {:?}",
                        template
                    )))
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            segments,
            date_format: date_format.to_string(),
        })
    }

    /// Render one record. The result carries no trailing newline.
    pub fn render<Tz>(&self, time: &DateTime<Tz>, name: &str, level: Level, message: &str) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut out = String::with_capacity(message.len() + 48);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::AscTime => {
                    let _ = write!(out, "{}", time.format(&self.date_format));
                }
                Segment::Msecs => {
                    let _ = write!(out, "{:03}", time.timestamp_subsec_millis().min(999));
                }
                Segment::Name => out.push_str(name),
                Segment::LevelName => out.push_str(level.as_str()),
                Segment::Message => out.push_str(message),
            }
        }
        out
    }
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::AscTime,
                Segment::Literal(".".into()),
                Segment::Msecs,
                Segment::Literal(":".into()),
                Segment::Name,
                Segment::Literal(":".into()),
                Segment::Message,
            ],
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}
