//! Small demonstration tools.

use dispatch::{ToolDescriptor, ToolError};

pub const ECHO: &str = "echo";
pub const DATA: &str = "data";

const SAMPLE_TABLE: &str = "column1,column2\n1,4\n2,5\n3,6";

/// Repeats its input back.
pub fn echo() -> ToolDescriptor {
    ToolDescriptor::new(
        ECHO,
        "Repeats the given text back.",
        |input: &str| -> Result<String, ToolError> {
            if input.trim().is_empty() {
                return Err(ToolError::InvalidInput("no input provided".into()));
            }
            Ok(format!("Tool processed: {input}"))
        },
    )
    .with_tags(["echo", "repeat"])
    .with_examples(["echo hello world", "repeat after me"])
}

/// Returns a fixed CSV table.
pub fn data() -> ToolDescriptor {
    ToolDescriptor::new(
        DATA,
        "Fetches and returns tabular data.",
        |_: &str| -> Result<String, ToolError> { Ok(SAMPLE_TABLE.to_string()) },
    )
    .with_tags(["data", "table"])
    .with_examples(["Get the data table"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_prefixes_input() {
        assert_eq!(echo().invoke("hello").unwrap(), "Tool processed: hello");
        assert!(matches!(echo().invoke("  "), Err(ToolError::InvalidInput(_))));
    }

    #[test]
    fn data_returns_table() {
        let table = data().invoke("anything").unwrap();
        let rows: Vec<_> = table.lines().collect();
        assert_eq!(rows, ["column1,column2", "1,4", "2,5", "3,6"]);
    }
}
