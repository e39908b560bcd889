// Status output for the engines

use indicatif::ProgressBar;
use std::sync::Mutex;

/// Where engines send their human-readable status lines.
pub trait Reporter: Send + Sync {
    /// Routine status, dropped when output is suppressed.
    fn message(&self, line: &str);

    /// Outcome lines that are shown even when output is suppressed.
    fn announce(&self, line: &str);
}

/// Prints to stdout, optionally through a progress bar so spinner redraws do
/// not tear the lines.
#[derive(Default)]
pub struct ConsoleReporter {
    suppressed: bool,
    progress_bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppressed(mut self, suppressed: bool) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn with_progress_bar(mut self, progress_bar: ProgressBar) -> Self {
        self.progress_bar = Some(progress_bar);
        self
    }

    fn print(&self, line: &str) {
        match &self.progress_bar {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn message(&self, line: &str) {
        if !self.suppressed {
            self.print(line);
        }
    }

    fn announce(&self, line: &str) {
        self.print(line);
    }
}

/// Collects lines in memory.
#[derive(Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
    suppressed: bool,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppressed() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            suppressed: true,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn push(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

impl Reporter for MemoryReporter {
    fn message(&self, line: &str) {
        if !self.suppressed {
            self.push(line);
        }
    }

    fn announce(&self, line: &str) {
        self.push(line);
    }
}

/// The found-path summary: headline, tree size and one line per page.
///
/// `titles` and `path` are parallel; a title may fall back to the URL when it
/// could not be resolved.
pub fn generate_path_report(titles: &[String], path: &[String], tree_size: usize) -> String {
    let mut report = String::new();

    let first = titles.first().map(String::as_str).unwrap_or_default();
    let last = titles.last().map(String::as_str).unwrap_or_default();
    let clicks = path.len().saturating_sub(1);

    report.push_str(&format!(
        "You Can Get From \"{}\" to \"{}\" in {} Clicks \nTree Size: {}\n\nPath:\n",
        first, last, clicks, tree_size
    ));
    for (title, url) in titles.iter().zip(path) {
        report.push_str(&format!("{}: {}\n", title, url));
    }

    report
}

pub fn unreachable_message(max_iter: usize) -> String {
    format!(
        "You Cannot Navigate Between These Pages In {} Clicks",
        max_iter
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_suppression() {
        let reporter = MemoryReporter::suppressed();
        reporter.message("hidden");
        reporter.announce("shown");
        assert_eq!(reporter.lines(), vec!["shown"]);
    }

    #[test]
    fn test_generate_path_report() {
        let titles = vec!["Alpha".to_string(), "Beta".to_string(), "Delta".to_string()];
        let path = vec![
            "https://en.wikipedia.org/wiki/Alpha".to_string(),
            "https://en.wikipedia.org/wiki/Beta".to_string(),
            "https://en.wikipedia.org/wiki/Delta".to_string(),
        ];

        let report = generate_path_report(&titles, &path, 4);

        assert!(report.starts_with("You Can Get From \"Alpha\" to \"Delta\" in 2 Clicks"));
        assert!(report.contains("Tree Size: 4"));
        assert!(report.contains("Beta: https://en.wikipedia.org/wiki/Beta\n"));
    }

    #[test]
    fn test_unreachable_message() {
        assert_eq!(
            unreachable_message(2),
            "You Cannot Navigate Between These Pages In 2 Clicks"
        );
    }
}
