//! Build log sinks

use super::traits::BuildLog;

/// Writes the build log to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl BuildLog for ConsoleLog {
    fn println(&mut self, line: &str) {
        println!("{line}");
    }

    fn fatal_error(&mut self, message: &str) {
        eprintln!("FATAL: {message}");
    }
}

/// Keeps the build log in memory
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryLog {
    lines: Vec<String>,
}

impl MemoryLog {
    /// Creates an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every line written so far
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns true if any line contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl BuildLog for MemoryLog {
    fn println(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn fatal_error(&mut self, message: &str) {
        self.lines.push(format!("FATAL: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_records_lines() {
        let mut log = MemoryLog::new();
        log.println("Pushing \"app:v1\"");
        log.fatal_error("Error: boom");

        assert_eq!(log.lines(), ["Pushing \"app:v1\"", "FATAL: Error: boom"]);
        assert!(log.contains("boom"));
        assert!(!log.contains("v2"));
    }
}
