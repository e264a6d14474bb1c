use crate::domain::{XafsGroup, XasError, XasResult};
use crate::numerics::{interpolate_linear, is_non_decreasing, stable_mean};

/// Averages replicate scans onto the energy grid of the first one.
///
/// Each member's `mu` is interpolated linearly onto that grid (held at the
/// end values past its own range) and the pointwise mean becomes the merged
/// `mu`. Stage outputs are not carried over.
pub fn merge_groups(label: &str, groups: &[XafsGroup]) -> XasResult<XafsGroup> {
    let Some(first) = groups.first() else {
        return Err(XasError::input_validation(
            "INPUT.MERGE_EMPTY",
            format!("no groups to merge into '{}'", label),
        ));
    };

    if groups.len() == 1 {
        let mut merged = first.relabeled(label);
        merged.path = None;
        return Ok(merged);
    }

    for group in groups {
        if !is_non_decreasing(&group.energy) {
            return Err(XasError::input_validation(
                "INPUT.ENERGY_ORDER",
                format!(
                    "energy of '{}' is not sorted ascending; cannot merge into '{}'",
                    group.label, label
                ),
            ));
        }
    }

    let mut samples = vec![0.0; groups.len()];
    let mut mu = Vec::with_capacity(first.len());
    for &energy in &first.energy {
        for (slot, group) in samples.iter_mut().zip(groups) {
            *slot = interpolate_linear(energy, &group.energy, &group.mu).ok_or_else(|| {
                XasError::internal(
                    "SYS.MERGE_INTERPOLATE",
                    format!("failed to interpolate '{}' at {}", group.label, energy),
                )
            })?;
        }
        mu.push(stable_mean(&samples).unwrap_or(f64::NAN));
    }

    XafsGroup::new(label, first.energy.clone(), mu)
}
