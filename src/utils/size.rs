//! Size accounting for processed files.

use std::fmt;

/// Byte sizes of a file before and after processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Savings {
    pub before: usize,
    pub after: usize,
}

impl Savings {
    pub const fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }

    /// Percentage saved, negative when the file grew.
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.before == 0 {
            return 0.0;
        }
        (self.before as f64 - self.after as f64) * 100.0 / self.before as f64
    }
}

impl std::ops::AddAssign for Savings {
    fn add_assign(&mut self, rhs: Self) {
        self.before += rhs.before;
        self.after += rhs.after;
    }
}

impl fmt::Display for Savings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} ({:.1}%)",
            format_size(self.before),
            format_size(self.after),
            self.percent()
        )
    }
}

/// Human-readable byte size: `512 B`, `1.5 KB`, `2.0 MB`.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_savings_percent() {
        assert_eq!(Savings::new(200, 50).percent(), 75.0);
        assert_eq!(Savings::new(100, 120).percent(), -20.0);
        assert_eq!(Savings::new(0, 0).percent(), 0.0);
    }

    #[test]
    fn test_savings_display_and_sum() {
        let mut total = Savings::new(1024, 512);
        total += Savings::new(1024, 512);
        assert_eq!(total.to_string(), "2.0 KB → 1.0 KB (50.0%)");
    }
}
