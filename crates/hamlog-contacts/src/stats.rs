//! Run summary reporting.

use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use hamlog_core::{Counter, CounterSnapshot, fmt_num};

/// One written output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStats {
    pub name: &'static str,
    pub dir: PathBuf,
    pub lines: usize,
}

/// Everything a finished (or aborted) run reports
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub input_files: usize,
    pub input_lines: usize,
    pub counters: CounterSnapshot,
    pub outputs: Vec<OutputStats>,
    pub elapsed: Duration,
}

fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl RunSummary {
    /// Share of tokens rejected by the grammar, in percent
    pub fn invalid_pct(&self) -> f64 {
        let valid = self.counters.get(Counter::ValidSigns);
        let invalid = self.counters.get(Counter::InvalidSigns);
        pct(invalid, valid + invalid)
    }

    /// Format summary table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Contact Log Run")
                    .fg(Color::Cyan)
                    .add_attribute(Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            Cell::new("Input"),
            Cell::new(format!(
                "{} lines in {} files",
                fmt_num(self.input_lines as u64),
                self.input_files
            )),
        ]);
        for (counter, value) in self.counters.iter() {
            let cell = match counter {
                Counter::InvalidSigns => {
                    format!("{} ({:.1}%)", fmt_num(value), self.invalid_pct())
                }
                _ => fmt_num(value),
            };
            let cell = if counter == Counter::FailedLookups && value > 0 {
                Cell::new(cell).fg(Color::Yellow)
            } else {
                Cell::new(cell)
            };
            table.add_row(vec![Cell::new(counter.label()), cell]);
        }
        for out in &self.outputs {
            table.add_row(vec![
                Cell::new(format!("→ {}", out.name)),
                Cell::new(format!("{} lines", fmt_num(out.lines as u64))),
            ]);
        }
        table.add_row(vec![
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
        ]);

        table.to_string()
    }

    /// Log the summary line by line (non-TTY mode).
    pub fn log(&self) {
        log::info!("=== Contact Log Summary ===");
        log::info!(
            "Input: {} lines in {} files",
            fmt_num(self.input_lines as u64),
            self.input_files
        );
        for (counter, value) in self.counters.iter() {
            log::info!("{}: {}", counter.label(), fmt_num(value));
        }
        for out in &self.outputs {
            log::info!("{}: {} lines -> {}", out.name, fmt_num(out.lines as u64), out.dir.display());
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamlog_core::PipelineCounters;

    fn summary() -> RunSummary {
        let counters = PipelineCounters::new();
        counters.add(Counter::ValidSigns, 90);
        counters.add(Counter::InvalidSigns, 10);
        counters.add(Counter::FailedLookups, 2);
        RunSummary {
            input_files: 2,
            input_lines: 1234,
            counters: counters.snapshot(),
            outputs: vec![OutputStats {
                name: "countries",
                dir: PathBuf::from("out/countries"),
                lines: 12,
            }],
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn invalid_share() {
        assert!((summary().invalid_pct() - 10.0).abs() < 1e-9);
        assert_eq!(RunSummary::default().invalid_pct(), 0.0);
    }

    #[test]
    fn table_mentions_everything() {
        let text = summary().format_table();
        assert!(text.contains("1,234 lines in 2 files"));
        assert!(text.contains("Invalid call signs"));
        assert!(text.contains("10 (10.0%)"));
        assert!(text.contains("countries"));
        assert!(text.contains("1.5s"));
    }
}
