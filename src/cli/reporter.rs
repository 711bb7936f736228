// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::geometry::{Overlap, Registry, SanityReport};
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Summary of a finished build
    pub fn report_build(hpge: &str, registry: &Registry, output: Option<&Path>, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Detector:".bold(), hpge.cyan());
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "  {} {}",
            "Logical volumes:".bright_black(),
            registry.logical_volumes().len().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Physical volumes:".bright_black(),
            registry.physical_volumes().len().to_string().cyan()
        );
        if let Some(output) = output {
            println!(
                "  {} {}",
                "Written:".bright_black(),
                output.display().to_string().cyan()
            );
        }
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    pub fn report_sanity(report: &SanityReport) {
        for warning in &report.warnings {
            Self::report_warning(warning);
        }
        for error in &report.errors {
            Self::report_error(error);
        }
    }

    pub fn report_overlaps(overlaps: &[Overlap]) {
        if overlaps.is_empty() {
            Self::success("No overlaps found");
            return;
        }
        println!(
            "\n{} {}",
            "⚠️  Overlaps:".yellow().bold(),
            overlaps.len().to_string().yellow()
        );
        for overlap in overlaps {
            println!("  {} {}", "•".yellow(), overlap);
        }
    }

    /// Volume listing from `--print-volumes`
    pub fn report_volumes(kind: &str, lines: &[String]) {
        println!("{} {}", format!("{} volumes:", kind).bold(), lines.len());
        for line in lines {
            println!("  {}", line);
        }
    }

    /// Profile plot legend, each name in its line color
    pub fn report_legend(path: &Path, legend: &[(String, [u8; 3])]) {
        Self::report_info(&format!("profile plot saved to {}", path.display()));
        for (name, [r, g, b]) in legend {
            println!("  {} {}", "━━".truecolor(*r, *g, *b), name);
        }
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

    pub fn progress(message: &str) {
        println!("{} {}...", "⏳".bright_blue(), message.bright_black());
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
