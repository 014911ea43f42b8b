use std::io::Write;

use serde_json::Value;

use crate::error::CliError;

pub fn render(data: &Value, pretty: bool) -> Result<(), CliError> {
    let text = to_text(data, pretty)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

fn to_text(data: &Value, pretty: bool) -> Result<String, CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn compact_output_is_one_line() {
        let text = to_text(&json!({ "rows_written": 2 }), false).expect("render");
        assert_eq!(text, r#"{"rows_written":2}"#);
    }

    #[test]
    fn pretty_output_is_indented() {
        let text = to_text(&json!({ "rows_written": 2 }), true).expect("render");
        assert!(text.contains("\n  \"rows_written\": 2"));
    }
}
