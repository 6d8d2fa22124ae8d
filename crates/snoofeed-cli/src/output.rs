use std::io::Write;

use serde_json::Value;

use crate::error::CliError;

/// Print a result document to stdout as JSON.
pub fn render(value: &Value, pretty: bool) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    render_to(&mut handle, value, pretty)
}

fn render_to(writer: &mut impl Write, value: &Value, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_output_is_one_line_of_valid_json() {
        let mut buffer = Vec::new();
        render_to(&mut buffer, &json!({"post_count": 2}), false).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with('\n'));
        let round_trip: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(round_trip["post_count"], 2);
    }

    #[test]
    fn pretty_output_is_indented() {
        let mut buffer = Vec::new();
        render_to(&mut buffer, &json!({"posts": [1, 2]}), true).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\n  "));
    }
}
