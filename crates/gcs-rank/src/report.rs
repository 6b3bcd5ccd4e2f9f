//! Ranking report rendering.
//!
//! One fixed-width row per contingency in ranked order, suitable both for
//! the results file and for echoing to stdout.

use anyhow::{Context, Result};
use gcs_core::ContingencyRecord;
use std::io::Write;
use tabwriter::TabWriter;

/// Render the ranking report. `tap_changers` adds the tap-movement count
/// column.
pub fn render_ranking_report(
    ranked: &[ContingencyRecord],
    tap_changers: bool,
) -> Result<String> {
    let mut writer = TabWriter::new(Vec::new());

    let mut header = vec![
        "POS", "ID", "NAME", "ELEMS", "STATUS", "MIN V", "MAX V", "ITERS", "GEN Q", "GEN U",
        "VOLT", "FLOW",
    ];
    if tap_changers {
        header.push("TAPS");
    }
    header.push("SCORE");
    writeln!(writer, "{}", header.join("\t")).context("rendering report header")?;

    for (position, record) in ranked.iter().enumerate() {
        let status = record.status_label().unwrap_or("OK");
        let score = record
            .final_score
            .as_ref()
            .map_or_else(String::new, |s| s.display());
        let mut row = vec![
            format!("{}", position + 1),
            record.id.clone(),
            record.name.clone(),
            format!("{}", record.affected_elements.len()),
            status.to_string(),
            format!("{}", record.min_voltages.len()),
            format!("{}", record.max_voltages.len()),
            format!("{}", record.iterations),
            format!("{}", record.gen_reactive_constraints.len()),
            format!("{}", record.gen_voltage_constraints.len()),
            format!("{}", record.voltage_constraints.len()),
            format!("{}", record.flow_constraints.len()),
        ];
        if tap_changers {
            row.push(format!("{}", record.tap_count()));
        }
        row.push(score);
        writeln!(writer, "{}", row.join("\t")).context("rendering report row")?;
    }

    writer.flush().context("flushing report table")?;
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("finalizing report table: {err}"))?;
    String::from_utf8(bytes).context("report table is not valid UTF-8")
}
