//! Report Module
//!
//! Boxed end-of-run summary for batch operations.

use crate::batch::BatchResult;
use crate::types::FileSize;
use std::io::{self, Write};
use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Percentage saved going from `input_bytes` to `output_bytes`; negative when
/// the output grew.
pub fn size_reduction_percent(input_bytes: u64, output_bytes: u64) -> f64 {
    if input_bytes > 0 {
        (1.0 - output_bytes as f64 / input_bytes as f64) * 100.0
    } else {
        0.0
    }
}

pub fn write_summary_report<W: Write>(
    out: &mut W,
    result: &BatchResult,
    duration: Duration,
    input_bytes: u64,
    output_bytes: u64,
    operation_name: &str,
) -> io::Result<()> {
    let reduction = size_reduction_percent(input_bytes, output_bytes);
    let rule = "═".repeat(62);

    writeln!(out)?;
    writeln!(out, "╔{}╗", rule)?;
    writeln!(out, "║  📊 {:<56}║", format!("{} Summary Report", operation_name))?;
    writeln!(out, "╠{}╣", rule)?;
    writeln!(out, "║  📁 Files Processed:    {:>10}{:27}║", result.total, "")?;
    writeln!(out, "║  ✅ Succeeded:          {:>10}{:27}║", result.succeeded, "")?;
    writeln!(out, "║  ❌ Failed:             {:>10}{:27}║", result.failed, "")?;
    writeln!(out, "║  ⏭️  Skipped:            {:>10}{:27}║", result.skipped, "")?;
    writeln!(out, "║  📈 Success Rate:       {:>9.1}%{:27}║", result.success_rate(), "")?;
    writeln!(out, "╠{}╣", rule)?;
    writeln!(out, "║  💾 Input Size:         {:>10}{:27}║", FileSize::new(input_bytes).to_string(), "")?;
    writeln!(out, "║  💾 Output Size:        {:>10}{:27}║", FileSize::new(output_bytes).to_string(), "")?;
    writeln!(out, "║  📉 Size Reduction:     {:>9.1}%{:27}║", reduction, "")?;
    writeln!(out, "╠{}╣", rule)?;
    writeln!(out, "║  ⏱️  Total Time:         {:>10}{:27}║", format_duration(duration), "")?;
    if result.succeeded > 0 {
        let avg_time = duration.as_secs_f64() / result.succeeded as f64;
        writeln!(out, "║  ⏱️  Avg Time/File:      {:>9.2}s{:27}║", avg_time, "")?;
    }
    writeln!(out, "╚{}╝", rule)?;

    if !result.errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "❌ Errors encountered:")?;
        writeln!(out, "{}", "━".repeat(64))?;
        for (path, error) in &result.errors {
            writeln!(out, "   {} → {}", path.display(), error)?;
        }
    }

    Ok(())
}
