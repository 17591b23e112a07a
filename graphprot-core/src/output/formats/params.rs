use std::io::{BufRead, Write};

use crate::config::ParameterSet;
use crate::types::{GraphProtError, Task};

/// `key value` lines, loadable by [`read_params_format`]
pub fn write_params_format<W: Write>(
    writer: &mut W,
    task: Task,
    params: &ParameterSet,
) -> Result<(), GraphProtError> {
    writeln!(writer, "mode {task}")?;
    writeln!(writer, "R {}", params.radius)?;
    writeln!(writer, "D {}", params.distance)?;
    writeln!(writer, "bitsize {}", params.bitsize)?;
    writeln!(writer, "lambda {}", params.lambda)?;
    writeln!(writer, "epsilon {}", params.epsilon)?;
    writeln!(writer, "c {}", params.cost)?;
    writeln!(writer, "epochs {}", params.epochs)?;
    writeln!(writer, "abstraction {}", u8::from(params.abstraction))?;
    writeln!(writer, "onlyseq {}", u8::from(params.sequence_only))?;
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, line: usize) -> Result<T, GraphProtError> {
    value.parse().map_err(|_| {
        GraphProtError::ParseError(format!("params line {line}: invalid value '{value}' for {key}"))
    })
}

fn parse_flag(key: &str, value: &str, line: usize) -> Result<bool, GraphProtError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(GraphProtError::ParseError(format!(
            "params line {line}: invalid flag '{value}' for {key}"
        ))),
    }
}

/// Parse a params file. Missing keys keep their defaults; the mode is
/// returned when present.
///
/// # Errors
///
/// [`GraphProtError::ParseError`] for unknown keys or unparsable values,
/// [`GraphProtError::InvalidParameter`] when the result fails validation.
pub fn read_params_format<R: BufRead>(
    reader: R,
) -> Result<(Option<Task>, ParameterSet), GraphProtError> {
    let mut task = None;
    let mut params = ParameterSet::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut fields = trimmed.split_whitespace();
        let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(GraphProtError::ParseError(format!(
                "params line {line_number}: expected 'key value', got '{trimmed}'"
            )));
        };

        match key {
            "mode" => task = Some(value.parse()?),
            "R" => params.radius = parse_value(key, value, line_number)?,
            "D" => params.distance = parse_value(key, value, line_number)?,
            "bitsize" => params.bitsize = parse_value(key, value, line_number)?,
            "lambda" => params.lambda = parse_value(key, value, line_number)?,
            "epsilon" => params.epsilon = parse_value(key, value, line_number)?,
            "c" => params.cost = parse_value(key, value, line_number)?,
            "epochs" => params.epochs = parse_value(key, value, line_number)?,
            "abstraction" => params.abstraction = parse_flag(key, value, line_number)?,
            "onlyseq" => params.sequence_only = parse_flag(key, value, line_number)?,
            unknown => {
                return Err(GraphProtError::ParseError(format!(
                    "params line {line_number}: unknown key '{unknown}'"
                )));
            }
        }
    }

    params.validate()?;
    Ok((task, params))
}
