//! Token budget summary and JSON printing

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::flatten::FlattenResult;
use crate::tokens::Percentage;

/// Usage above this share of a window is highlighted as a warning.
const WARN_PERCENT: f64 = 75.0;

/// Print the token summary to stderr with optional color.
pub fn print_summary(result: &FlattenResult, use_color: bool) -> io::Result<()> {
    let color_choice = if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(color_choice);
    write_summary(&mut stderr, result)
}

/// Render the summary as plain text.
pub fn format_summary(result: &FlattenResult) -> String {
    let mut buf = Buffer::no_color();
    // Writing into an in-memory buffer cannot fail
    let _ = write_summary(&mut buf, result);
    String::from_utf8_lossy(buf.as_slice()).into_owned()
}

fn write_summary<W: WriteColor>(out: &mut W, result: &FlattenResult) -> io::Result<()> {
    let mut bold = ColorSpec::new();
    bold.set_bold(true);

    let summary = &result.summary;
    writeln!(
        out,
        "{} directories, {} files ({} excluded, {} missing)",
        summary.directories, summary.files, summary.excluded, summary.missing
    )?;

    out.set_color(&bold)?;
    write!(out, "Tokens: ")?;
    out.reset()?;
    writeln!(out, "{}", format_number(result.token_count))?;

    let mut name_color = ColorSpec::new();
    name_color.set_fg(Some(Color::Cyan));

    for model in &result.model_percentages {
        write!(out, "  ")?;
        out.set_color(&name_color)?;
        write!(out, "{:<8}", model.name)?;
        out.reset()?;

        match model.percentage {
            Percentage::Value(v) if v >= 100.0 => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            }
            Percentage::Value(v) if v >= WARN_PERCENT => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            }
            Percentage::Unavailable => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            }
            Percentage::Value(_) => {}
        }
        writeln!(out, "{:>10}", model.percentage.to_string())?;
        out.reset()?;
    }

    Ok(())
}

/// Format a number with thousand separators.
fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::new();

    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    if n < 0 {
        result.insert(0, '-');
    }
    result
}

/// Print any serializable value as pretty-printed JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
