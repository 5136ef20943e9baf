use serde_json::Value;
use std::io::{self, Read};

/// Read piped JSON from stdin. Returns None when stdin is a TTY or the pipe
/// is empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse stdin as JSON: {e}"))?;
    Ok(Some(value))
}

/// `--input <file>` if given, otherwise piped stdin, otherwise an error
/// naming the command.
pub fn read_input_value(
    path: Option<&str>,
    command: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return super::file::read_json_value(path);
    }
    match read_stdin()? {
        Some(value) => Ok(value),
        None => Err(format!("--input <file.json> or stdin required for {command}").into()),
    }
}
