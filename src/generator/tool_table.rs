//! Machine tool-table output: update lines and the master-table merge.

use crate::config::RPM_NOT_APPLICABLE;
use crate::error::{PublishError, Result};
use crate::measure::{extract_numeric, FieldType};
use crate::model::ToolRecord;
use std::collections::BTreeMap;

/// Render one tool-table update line.
///
/// Only the tool number, RPM override, diameter and remark carry real
/// data; the remaining axis fields are fixed placeholders the controller
/// expects to see.
pub fn generate_tool_table_line(record: &ToolRecord, machine_max_rpm: i64) -> String {
    let diameter = record
        .tool_diameter
        .as_deref()
        .and_then(|d| extract_numeric(d, FieldType::Dimension))
        .unwrap_or(0.0);

    format!(
        "T{n} P0 X0 Y0 Z0 A0 B0 C0 {u} V0 W0 D{d:.4} I0 J0 Q0 ;{name}",
        n = record.tool_number,
        u = rpm_field(record.tool_max_rpm, machine_max_rpm),
        d = diameter,
        name = record.display_name(),
    )
}

/// Render update lines for a batch of tools.
pub fn generate_tool_table_lines(records: &[ToolRecord], machine_max_rpm: i64) -> Vec<String> {
    records
        .iter()
        .map(|r| generate_tool_table_line(r, machine_max_rpm))
        .collect()
}

/// The U field encodes the spindle override: `-1` passes the sentinel
/// through, values at the machine ceiling (or zero, or absent) collapse
/// to `U0` so the controller runs its default.
fn rpm_field(tool_max_rpm: Option<i64>, machine_max_rpm: i64) -> String {
    match tool_max_rpm {
        Some(RPM_NOT_APPLICABLE) => "U-1".to_string(),
        Some(rpm) if rpm != 0 && rpm != machine_max_rpm => format!("U{rpm}"),
        _ => "U0".to_string(),
    }
}

/// One parsed update line.
struct UpdateEntry {
    diameter: String,
    u_value: String,
    remark: String,
}

/// Merge freshly generated update lines into the master tool table.
///
/// The master's leading `;` comment line survives as the header. Tools on
/// the exceptions list keep their master line verbatim. Existing tools
/// keep the master's T, P and Z+ offset fields while taking diameter, U
/// and remark from the update; new tools get `P0` and a zero Z offset.
/// Master tools missing from the update are dropped unless excepted.
/// Output is sorted by tool number.
pub fn merge_master_table(
    master_text: &str,
    update_lines: &[String],
    exceptions: &[u32],
) -> Result<String> {
    let mut master_lines = master_text.lines().filter(|l| !l.trim().is_empty());

    let first = master_lines.next().ok_or(PublishError::EmptyMasterTable)?;
    let (header, rest): (Option<&str>, Vec<&str>) = if first.trim_start().starts_with(';') {
        (Some(first), master_lines.collect())
    } else {
        let mut lines = vec![first];
        lines.extend(master_lines);
        (None, lines)
    };

    let mut master: BTreeMap<u32, String> = BTreeMap::new();
    for line in rest {
        let number = tool_number_of(line)?;
        master.insert(number, line.trim_end().to_string());
    }

    let mut updates: BTreeMap<u32, UpdateEntry> = BTreeMap::new();
    for line in update_lines {
        if line.trim().is_empty() {
            continue;
        }
        let number = tool_number_of(line)?;
        updates.insert(number, parse_update_line(line)?);
    }

    let mut merged: BTreeMap<u32, String> = BTreeMap::new();
    for (&number, update) in &updates {
        if exceptions.contains(&number) {
            if let Some(line) = master.get(&number) {
                merged.insert(number, line.clone());
                continue;
            }
        }

        let line = match master.get(&number) {
            Some(master_line) => {
                let parts: Vec<&str> = master_line.split_whitespace().collect();
                if parts.len() < 2 {
                    return Err(PublishError::MalformedTableLine {
                        line: master_line.clone(),
                    });
                }
                let z_value = parts
                    .iter()
                    .find(|p| p.starts_with("Z+"))
                    .copied()
                    .unwrap_or("Z+0.000000");
                format_merged_line(parts[0], parts[1], z_value, update)
            }
            None => format_merged_line(&format!("T{number}"), "P0", "Z+0.000000", update),
        };
        merged.insert(number, line);
    }

    // Excepted master tools survive even without an update line.
    for (&number, line) in &master {
        if !updates.contains_key(&number) && exceptions.contains(&number) {
            merged.insert(number, line.clone());
        }
    }

    let mut out = String::new();
    if let Some(header) = header {
        out.push_str(header.trim_end());
        out.push('\n');
    }
    for line in merged.values() {
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

fn format_merged_line(t: &str, p: &str, z: &str, update: &UpdateEntry) -> String {
    format!(
        "{:<7}{:<7}{:<13}{:<13}{:<5} {}",
        t, p, z, update.diameter, update.u_value, update.remark
    )
    .trim_end()
    .to_string()
}

/// Tool number from the leading `T<n>` token.
fn tool_number_of(line: &str) -> Result<u32> {
    let token = line.split_whitespace().next().unwrap_or("");
    token
        .strip_prefix('T')
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| PublishError::MalformedTableLine {
            line: line.to_string(),
        })
}

/// Parse an update line: diameter and U tokens plus the `;` remark.
fn parse_update_line(line: &str) -> Result<UpdateEntry> {
    let (fields, remark) = match line.split_once(';') {
        Some((fields, remark)) => (fields, remark.trim()),
        None => (line, ""),
    };

    let tokens: Vec<&str> = fields.split_whitespace().collect();
    let diameter = tokens
        .iter()
        .find_map(|t| t.strip_prefix('D'))
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| PublishError::MalformedTableLine {
            line: line.to_string(),
        })?;
    let u_value = tokens
        .iter()
        .find(|t| t.starts_with('U'))
        .copied()
        .unwrap_or("U0");

    let remark = remark.trim_start_matches(';').trim();
    let remark = if remark.is_empty() {
        String::new()
    } else {
        format!("; {remark}")
    };

    Ok(UpdateEntry {
        diameter: format!("D+{diameter:.6}"),
        u_value: u_value.to_string(),
        remark,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(number: u32, name: &str, rpm: Option<i64>, diameter: &str) -> ToolRecord {
        ToolRecord {
            tool_number: number,
            tool_name: Some(name.to_string()),
            tool_max_rpm: rpm,
            tool_diameter: Some(diameter.to_string()),
            ..Default::default()
        }
    }

    // ==================== update line tests ====================

    #[test]
    fn test_line_with_rpm_override() {
        let line = generate_tool_table_line(&record(21, "Test Bit", Some(18000), "0.25 in"), 24000);
        assert_eq!(
            line,
            "T21 P0 X0 Y0 Z0 A0 B0 C0 U18000 V0 W0 D0.2500 I0 J0 Q0 ;Test Bit"
        );
    }

    #[test]
    fn test_line_rpm_sentinel() {
        let line = generate_tool_table_line(&record(5, "Probe", Some(-1), "0.25 in"), 24000);
        assert!(line.contains(" U-1 "));
    }

    #[test]
    fn test_line_rpm_at_machine_max_collapses() {
        let line = generate_tool_table_line(&record(5, "Bit", Some(24000), "0.25 in"), 24000);
        assert!(line.contains(" U0 "));
        let line = generate_tool_table_line(&record(5, "Bit", None, "0.25 in"), 24000);
        assert!(line.contains(" U0 "));
        let line = generate_tool_table_line(&record(5, "Bit", Some(0), "0.25 in"), 24000);
        assert!(line.contains(" U0 "));
    }

    #[test]
    fn test_line_metric_diameter_converted() {
        let line = generate_tool_table_line(&record(7, "Metric Bit", None, "12.7mm"), 24000);
        assert!(line.contains(" D0.5000 "));
    }

    #[test]
    fn test_line_missing_diameter_is_zero() {
        let mut r = record(9, "No Dia", None, "");
        r.tool_diameter = None;
        let line = generate_tool_table_line(&r, 24000);
        assert!(line.contains(" D0.0000 "));
    }

    // ==================== merge tests ====================

    fn master() -> String {
        [
            ";Master tool table",
            "T21    P21    Z+1.250000   D+0.125000   U0    ; Old Bit",
            "T100   P100   Z+0.500000   D+0.999000   U0    ; Surfacing",
            "T30    P30    Z+2.000000   D+0.250000   U0    ; Stale",
        ]
        .join("\n")
    }

    #[test]
    fn test_merge_preserves_z_and_updates_diameter() {
        let updates =
            vec!["T21 P0 X0 Y0 Z0 A0 B0 C0 U18000 V0 W0 D0.2500 I0 J0 Q0 ;Test Bit".to_string()];
        let merged = merge_master_table(&master(), &updates, &[100]).unwrap();

        assert_eq!(
            merged,
            ";Master tool table\n\
             T21    P21    Z+1.250000   D+0.250000   U18000 ; Test Bit\n\
             T100   P100   Z+0.500000   D+0.999000   U0    ; Surfacing\n"
        );
    }

    #[test]
    fn test_merge_adds_new_tool() {
        let updates =
            vec!["T42 P0 X0 Y0 Z0 A0 B0 C0 U0 V0 W0 D0.1250 I0 J0 Q0 ;New Bit".to_string()];
        let merged = merge_master_table(&master(), &updates, &[]).unwrap();
        assert!(merged.contains("T42    P0     Z+0.000000   D+0.125000   U0    ; New Bit\n"));
    }

    #[test]
    fn test_merge_drops_stale_tools_unless_excepted() {
        let updates =
            vec!["T21 P0 X0 Y0 Z0 A0 B0 C0 U0 V0 W0 D0.2500 I0 J0 Q0 ;Test Bit".to_string()];
        let merged = merge_master_table(&master(), &updates, &[100]).unwrap();
        assert!(!merged.contains("T30"));
        assert!(merged.contains("T100"));
    }

    #[test]
    fn test_merge_exception_keeps_master_line_verbatim() {
        let updates =
            vec!["T100 P0 X0 Y0 Z0 A0 B0 C0 U0 V0 W0 D0.5000 I0 J0 Q0 ;Changed".to_string()];
        let merged = merge_master_table(&master(), &updates, &[100]).unwrap();
        assert!(merged.contains("T100   P100   Z+0.500000   D+0.999000   U0    ; Surfacing"));
        assert!(!merged.contains("Changed"));
    }

    #[test]
    fn test_merge_sorted_by_tool_number() {
        let updates = vec![
            "T100 P0 X0 Y0 Z0 A0 B0 C0 U0 V0 W0 D0.9990 I0 J0 Q0 ;Surfacing".to_string(),
            "T3 P0 X0 Y0 Z0 A0 B0 C0 U0 V0 W0 D0.1250 I0 J0 Q0 ;Small".to_string(),
        ];
        let merged = merge_master_table(";hdr\nT100 P100 Z+0.1 D+0.9 U0 ;x", &updates, &[]).unwrap();
        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines[0], ";hdr");
        assert!(lines[1].starts_with("T3 "));
        assert!(lines[2].starts_with("T100"));
    }

    #[test]
    fn test_merge_empty_master_is_error() {
        let err = merge_master_table("", &[], &[]).unwrap_err();
        assert!(matches!(err, PublishError::EmptyMasterTable));
    }

    #[test]
    fn test_merge_malformed_master_line_is_error() {
        let err = merge_master_table(";hdr\nnot a tool line", &[], &[]).unwrap_err();
        assert!(matches!(err, PublishError::MalformedTableLine { .. }));
    }
}
