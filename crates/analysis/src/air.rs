//! Adverse impact ratio against each attribute's reference group

use contracts::{AirRecord, GroupRate};

use crate::rates::GroupSpec;

/// AIR and ΔSR of every group. Both are undefined when either rate is
/// undefined or the reference rate is zero.
pub fn adverse_impact(
    specs: &[GroupSpec],
    rates: &[GroupRate],
    threshold: f64,
) -> Vec<AirRecord> {
    rates
        .iter()
        .map(|row| {
            let reference = specs
                .iter()
                .find(|s| s.attribute == row.attribute)
                .map(|s| s.reference.as_str());
            let reference_rate = reference.and_then(|value| {
                rates
                    .iter()
                    .find(|r| r.attribute == row.attribute && r.value == value)
                    .and_then(|r| r.selection_rate)
            });

            let (air, delta_sr) = match (row.selection_rate, reference_rate) {
                (Some(rate), Some(base)) if base > 0.0 => (Some(rate / base), Some(rate - base)),
                _ => (None, None),
            };

            AirRecord {
                attribute: row.attribute.clone(),
                value: row.value.clone(),
                is_reference: reference == Some(row.value.as_str()),
                appearances: row.appearances,
                selections: row.selections,
                selection_rate: row.selection_rate,
                reference_rate,
                air,
                delta_sr,
                below_four_fifths: air.map(|a| a < threshold),
            }
        })
        .collect()
}
