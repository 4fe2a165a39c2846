//! GitHub Actions workflow command encoding

/// Escape a workflow command message
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// `::command::message`
pub fn issue_command(command: &str, message: &str) -> String {
    format!("::{}::{}", command, escape_data(message))
}

/// `::command key=value,...::message`
pub fn issue_command_with_properties(
    command: &str,
    properties: &[(&str, &str)],
    message: &str,
) -> String {
    let properties = properties
        .iter()
        .map(|(k, v)| format!("{}={}", k, escape_property(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("::{} {}::{}", command, properties, escape_data(message))
}

/// Entry for a file command such as `GITHUB_OUTPUT`, using heredoc syntax so
/// values may span lines.
///
/// Fails when the delimiter occurs in the name or value, which would end the
/// entry early.
pub fn file_command_entry(name: &str, value: &str, delimiter: &str) -> Result<String, String> {
    if name.contains(delimiter) {
        return Err(format!(
            "Unexpected input: name should not contain the delimiter \"{}\"",
            delimiter
        ));
    }
    if value.contains(delimiter) {
        return Err(format!(
            "Unexpected input: value should not contain the delimiter \"{}\"",
            delimiter
        ));
    }
    Ok(format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\r\nnext"), "50%25 done%0D%0Anext");
    }

    #[test]
    fn test_escape_property() {
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
    }

    #[test]
    fn test_issue_command() {
        assert_eq!(
            issue_command("error", "Action error: line1\nline2"),
            "::error::Action error: line1%0Aline2"
        );
    }

    #[test]
    fn test_issue_command_with_properties() {
        assert_eq!(
            issue_command_with_properties("set-output", &[("name", "time")], "12:00:00"),
            "::set-output name=time::12:00:00"
        );
    }

    #[test]
    fn test_file_command_entry() {
        assert_eq!(
            file_command_entry("time", "10:11:12 GMT+0000", "EOF_1").unwrap(),
            "time<<EOF_1\n10:11:12 GMT+0000\nEOF_1\n"
        );
    }

    #[test]
    fn test_file_command_entry_rejects_delimiter() {
        assert!(file_command_entry("time", "x EOF_1 y", "EOF_1").is_err());
        assert!(file_command_entry("EOF_1", "x", "EOF_1").is_err());
    }
}
