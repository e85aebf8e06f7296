//! Wiki markup generation: per-tool pages and the library index page.

use crate::config::{PublishConfig, RPM_NOT_APPLICABLE};
use crate::measure::{format_measurement, group_thousands};
use crate::model::ToolRecord;

/// Per-tool page skeleton. `[INSERT_NOSERADIUS]` and
/// `[INSERT_CUTTINGRADIUS]` expand to full table rows only when the tool
/// carries those parameters, so their replacement must run before the
/// plain field placeholders.
const PAGE_TEMPLATE: &str = "
[[[IndexPage]|Back to Tool Library]]
==Tool [ToolNumber] - [ToolName]==
{| class=\"wikitable\"
|-
!style=\"width: 200px;\"| Attribute !!style=\"width: 400px;\"| Details
|-
| '''Tool #''' || [ToolNumber]
|-
| '''Tool Type''' || [ToolType]
|-
| '''Shank Size''' || [ToolShankSize]
|-
| '''Diameter''' || [ToolDiameter]
[INSERT_NOSERADIUS][INSERT_CUTTINGRADIUS]|-
| '''Flutes (FL)''' || [Flutes]
|-
| '''Overall Length (OAL)''' || [OAL]
|-
| '''Length of Cut (LOC)''' || [LOC]
|-
| '''Max RPM''' || [ToolMaxRPM]
|-
| '''Material''' || [ToolMaterial]
|-
| '''Coating''' || [ToolCoating]
|-
| '''Part Number''' || [PartNumber]
|-
| '''Manufacturer''' || [ManufacturerName]
|-
| '''Image''' || [[File:[ToolImageFileName]|frameless|left]]
|-
| '''Order Link''' || [[[ToolOrderURL] Click here to purchase this tool]]
|}

==Usage Information==
'''Compatible Materials''': [Materials]

'''Recommended Speeds and Feeds''':
 '''RPM''': [SuggestedRPM]
 '''Feed Rate''': [SuggestedFeedRate]
 '''Depth of Cut''': [SuggestedMaxDOC]

==Additional Notes==
[AdditionalNotes]";

/// Render the wiki page for one tool.
///
/// Pure text assembly, no I/O. Missing values render as `N/A`; shank
/// size and diameter render as fractional inches; RPM gets thousands
/// separators with the `-1` sentinel shown as `N/A`.
pub fn generate_wiki_page(record: &ToolRecord, config: &PublishConfig) -> String {
    let prec = config.precision;

    let mut page = PAGE_TEMPLATE.replace("[IndexPage]", &config.index_page);
    page = page.replace(
        "[INSERT_NOSERADIUS]",
        &radius_row(record, "NoseRadius", "Nose Radius", config),
    );
    page = page.replace(
        "[INSERT_CUTTINGRADIUS]",
        &radius_row(record, "CuttingRadius", "Cutting Radius", config),
    );

    let max_rpm = match record.tool_max_rpm {
        None => "N/A".to_string(),
        Some(RPM_NOT_APPLICABLE) => "N/A".to_string(),
        Some(rpm) => group_thousands(rpm),
    };

    let substitutions = [
        ("[ToolNumber]", record.tool_number.to_string()),
        ("[ToolName]", text_or_na(record.tool_name.as_deref())),
        ("[ToolType]", text_or_na(record.tool_type.as_deref())),
        (
            "[ToolShankSize]",
            format_measurement(
                record.tool_shank_size.as_deref().unwrap_or(""),
                prec,
                true,
                true,
            ),
        ),
        (
            "[ToolDiameter]",
            format_measurement(
                record.tool_diameter.as_deref().unwrap_or(""),
                prec,
                true,
                true,
            ),
        ),
        ("[Flutes]", text_or_na(record.flutes.as_deref())),
        (
            "[OAL]",
            format_measurement(record.oal.as_deref().unwrap_or(""), prec, false, true),
        ),
        (
            "[LOC]",
            format_measurement(record.loc.as_deref().unwrap_or(""), prec, false, true),
        ),
        ("[ToolMaxRPM]", max_rpm),
        ("[ToolMaterial]", text_or_na(record.tool_material.as_deref())),
        ("[ToolCoating]", text_or_na(record.tool_coating.as_deref())),
        ("[PartNumber]", text_or_na(record.part_number.as_deref())),
        (
            "[ManufacturerName]",
            text_or_na(record.manufacturer_name.as_deref()),
        ),
        (
            "[ToolOrderURL]",
            text_or_na(record.tool_order_url.as_deref()),
        ),
        ("[Materials]", text_or_na(record.materials.as_deref())),
        ("[SuggestedRPM]", text_or_na(record.suggested_rpm.as_deref())),
        (
            "[SuggestedMaxDOC]",
            text_or_na(record.suggested_max_doc.as_deref()),
        ),
        (
            "[AdditionalNotes]",
            text_or_na(record.additional_notes.as_deref()),
        ),
        (
            "[SuggestedFeedRate]",
            text_or_na(record.suggested_feed_rate.as_deref()),
        ),
        ("[ToolImageFileName]", record.image_file_name()),
    ];

    for (placeholder, value) in substitutions {
        page = page.replace(placeholder, &value);
    }
    page
}

/// Conditional radius row, empty when the parameter is absent or blank.
fn radius_row(record: &ToolRecord, param: &str, label: &str, config: &PublishConfig) -> String {
    match record.shape_parameter.get(param) {
        Some(value) if !value.trim().is_empty() => {
            let formatted = format_measurement(value, config.precision, true, true);
            format!("|-\n| '''{label}''' || {formatted}\n")
        }
        _ => String::new(),
    }
}

/// Render the index page: one link line per tool, in input order.
pub fn generate_index_page(records: &[ToolRecord], config: &PublishConfig) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "[[{index}/{prefix} {n}|Tool {n} - {name}]]<br>",
                index = config.index_page,
                prefix = config.page_prefix,
                n = r.tool_number,
                name = r.display_name(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn text_or_na(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => "N/A".to_string(),
    }
}
