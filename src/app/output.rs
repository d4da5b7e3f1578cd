//! One-line renderings for CLI output.

use crate::atlas::{MeasurementStatus, Probe};

/// `id  country  v4  v6  status  [tags]`, with `-` for missing values.
pub fn format_probe(probe: &Probe) -> String {
    let tags: Vec<&str> = probe.tags.iter().map(|t| t.slug.as_str()).collect();
    format!(
        "{:>7}  {:<2}  {:<15}  {:<39}  {}  [{}]",
        probe.id,
        probe.country().unwrap_or("-"),
        non_empty(probe.address_v4.as_deref()),
        non_empty(probe.address_v6.as_deref()),
        if probe.status.name.is_empty() {
            "-"
        } else {
            probe.status.name.as_str()
        },
        tags.join(",")
    )
}

/// Comma separated probe ids, in the given order.
pub fn probe_id_list(probes: &[Probe]) -> String {
    probes
        .iter()
        .map(|p| p.id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// `id  type  status  target  description`.
pub fn format_measurement(measurement: &MeasurementStatus) -> String {
    format!(
        "{}  {}  {}  {}  {}",
        measurement.id,
        non_empty(measurement.kind.as_deref()),
        if measurement.status.name.is_empty() {
            "-"
        } else {
            measurement.status.name.as_str()
        },
        non_empty(measurement.target.as_deref()),
        non_empty(measurement.description.as_deref()),
    )
}

fn non_empty(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}
