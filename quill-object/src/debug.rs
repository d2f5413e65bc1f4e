// quill-object - Source position tables for compiled code
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Mapping from bytecode offsets back to source positions.

/// Function name recorded for top-level code.
pub const MODULE_FUNCTION: &str = "<module>";

/// One row of a debug table: the source position of the instruction that
/// starts at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub offset: usize,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub function: String,
}

impl DebugEntry {
    /// `file:line:col`
    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Find the entry with the greatest offset at or before `offset`.
///
/// Entries are expected in ascending offset order, as the compiler emits
/// them. An empty function name is reported as `<module>`.
pub fn lookup(entries: &[DebugEntry], offset: usize) -> Option<DebugEntry> {
    let idx = entries.partition_point(|e| e.offset <= offset);
    let entry = entries[..idx].last()?;
    let mut found = entry.clone();
    if found.function.is_empty() {
        found.function = MODULE_FUNCTION.to_string();
    }
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset: usize, line: u32, function: &str) -> DebugEntry {
        DebugEntry {
            offset,
            file: "t.ql".to_string(),
            line,
            column: 1,
            function: function.to_string(),
        }
    }

    #[test]
    fn test_lookup_nearest_preceding() {
        let table = vec![entry(0, 1, ""), entry(4, 2, "f"), entry(9, 3, "f")];
        assert_eq!(lookup(&table, 0).map(|e| e.line), Some(1));
        assert_eq!(lookup(&table, 3).map(|e| e.line), Some(1));
        assert_eq!(lookup(&table, 4).map(|e| e.line), Some(2));
        assert_eq!(lookup(&table, 8).map(|e| e.line), Some(2));
        assert_eq!(lookup(&table, 100).map(|e| e.line), Some(3));
    }

    #[test]
    fn test_lookup_defaults_function_name() {
        let table = vec![entry(2, 1, "")];
        assert_eq!(lookup(&table, 1), None);
        assert_eq!(
            lookup(&table, 2).map(|e| e.function),
            Some("<module>".to_string())
        );
    }
}
