//! Minimal RFC 4180 reader and writer for the dataset files
//!
//! Fields containing a comma, a quote or a line break are quoted, with
//! embedded quotes doubled. The reader accepts `\n` and `\r\n` record
//! terminators and line breaks inside quoted fields.

use crate::error::{DatasetError, DatasetResult};

/// Quote a field when it needs it
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One record, without the terminator
pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header and records, each terminated by `\n`
pub fn write_records<S: AsRef<str>>(header: &[&str], records: &[Vec<S>]) -> String {
    let mut out = format_record(header);
    out.push('\n');
    for record in records {
        out.push_str(&format_record(record));
        out.push('\n');
    }
    out
}

/// A parsed record and the line it starts on (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Parse every record in `input`. Blank lines are skipped.
pub fn parse_records(input: &str) -> DatasetResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // A quoted field was closed; only a separator or terminator may follow
    let mut after_quote = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            ',' => {
                fields.push(std::mem::take(&mut field));
                after_quote = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                after_quote = false;
                line += 1;
                record_line = line;
            }
            '"' if field.is_empty() && !after_quote => in_quotes = true,
            _ if after_quote => {
                return Err(DatasetError::Malformed {
                    line,
                    message: format!("unexpected '{}' after closing quote", c),
                });
            }
            '"' => {
                return Err(DatasetError::Malformed {
                    line,
                    message: "quote inside unquoted field".to_string(),
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DatasetError::Malformed {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !fields.is_empty() || after_quote {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields.first().is_some_and(String::is_empty);
    if !blank {
        records.push(Record { line, fields });
    }
}
