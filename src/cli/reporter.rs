// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::config::GenerationConfig;
use crate::pipeline::PieceReport;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Run header
    pub fn report_config(config: &GenerationConfig) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Suit:".bold(), config.name.cyan());
        println!("{}", "━".repeat(80).bright_black());
        let pieces: Vec<&str> = config.pieces.iter().map(|p| p.as_str()).collect();
        println!("  {} {}", "Pieces:".bright_black(), pieces.join(", ").cyan());
        println!("  {} {}", "Build plate:".bright_black(), config.build_plate.to_string().cyan());
        println!("  {} {}", "Detail:".bright_black(), config.detail_level.to_string().cyan());
        println!(
            "  {} {}",
            "Mode:".bright_black(),
            if config.segmented { "segmented".cyan() } else { "monolithic".cyan() }
        );
        println!(
            "  {} {}",
            "Output:".bright_black(),
            config.output_dir.display().to_string().cyan()
        );
    }

    /// One exported piece
    pub fn report_piece(report: &PieceReport) {
        let status = if report.oversized.is_empty() {
            "✅".green()
        } else {
            "⚠️ ".yellow()
        };
        println!(
            "{} {:<10} {:>3} segments  {:>8}  {}",
            status,
            report.kind.as_str().bold(),
            report.segments,
            Self::format_duration(report.elapsed).yellow(),
            report.directory.display().to_string().bright_black()
        );
        for name in &report.oversized {
            println!("     {} {}", "still exceeds the build plate:".yellow(), name);
        }
    }

    /// Totals after a run
    pub fn report_summary(reports: &[PieceReport], total: Duration) {
        let segments: usize = reports.iter().map(|r| r.segments).sum();
        let oversized: usize = reports.iter().map(|r| r.oversized.len()).sum();
        println!("\n{}", "═".repeat(80).bright_black());
        println!("{}", "Generation Summary".bold());
        println!("{}", "═".repeat(80).bright_black());
        println!("  {} {}", "Pieces:".bright_black(), reports.len().to_string().cyan());
        println!("  {} {}", "Segments:".bright_black(), segments.to_string().cyan());
        println!(
            "  {} {}",
            "Oversized:".bright_black(),
            if oversized > 0 { oversized.to_string().red() } else { oversized.to_string().green() }
        );
        println!("  {} {}", "Time:".bright_black(), Self::format_duration(total).yellow());
        println!("{}", "═".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }
}
