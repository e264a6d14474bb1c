use super::traits::AnalysisEngine;
use super::PreEdgeParams;
use crate::domain::{Normalization, XafsGroup, XasError, XasResult};
use crate::numerics::{LineFit, argmax_finite, gradient, is_non_decreasing, linear_fit};

/// Fraction of the scan used for a line fit when its energy window is too
/// sparse.
const FALLBACK_FRACTION: usize = 10;

/// Built-in engine: linear pre-edge and post-edge lines, edge step at e0.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeStepEngine;

impl AnalysisEngine for EdgeStepEngine {
    fn name(&self) -> &'static str {
        "edge-step"
    }

    fn pre_edge(&self, group: &XafsGroup, params: &PreEdgeParams) -> XasResult<Normalization> {
        let energy = &group.energy;
        let mu = &group.mu;
        if energy.len() < 4 {
            return Err(XasError::input_validation(
                "INPUT.PRE_EDGE_POINTS",
                format!(
                    "'{}' has {} points; pre-edge normalization needs at least 4",
                    group.label,
                    energy.len()
                ),
            ));
        }
        if !is_non_decreasing(energy) {
            return Err(XasError::input_validation(
                "INPUT.ENERGY_ORDER",
                format!("energy of '{}' is not sorted ascending", group.label),
            ));
        }

        let e0 = match params.e0 {
            Some(e0) => e0,
            None => {
                let derivative = gradient(energy, mu);
                let index = argmax_finite(&derivative).ok_or_else(|| {
                    XasError::computation(
                        "RUN.E0",
                        format!("no finite derivative for '{}'", group.label),
                    )
                })?;
                energy[index]
            }
        };

        let pre_line = fit_window(energy, mu, e0 + params.pre1, e0 + params.pre2)
            .or_else(|| fit_head(energy, mu))
            .ok_or_else(|| line_error(&group.label, "pre-edge"))?;
        let post_line = fit_window(energy, mu, e0 + params.norm1, e0 + params.norm2)
            .or_else(|| fit_tail(energy, mu))
            .ok_or_else(|| line_error(&group.label, "post-edge"))?;

        let edge_step = post_line.at(e0) - pre_line.at(e0);
        if !edge_step.is_finite() || edge_step <= 0.0 {
            return Err(XasError::computation(
                "RUN.EDGE_STEP",
                format!(
                    "edge step for '{}' is {} at e0={}",
                    group.label, edge_step, e0
                ),
            ));
        }

        let pre_edge: Vec<f64> = energy.iter().map(|&e| pre_line.at(e)).collect();
        let post_edge: Vec<f64> = energy.iter().map(|&e| post_line.at(e)).collect();
        let norm: Vec<f64> = mu
            .iter()
            .zip(&pre_edge)
            .map(|(m, pre)| (m - pre) / edge_step)
            .collect();
        let flat = energy
            .iter()
            .zip(&norm)
            .zip(pre_edge.iter().zip(&post_edge))
            .map(|((&e, &n), (&pre, &post))| {
                if e > e0 {
                    n - (post - pre - edge_step) / edge_step
                } else {
                    n
                }
            })
            .collect();

        Ok(Normalization {
            e0,
            edge_step,
            pre_edge,
            post_edge,
            norm,
            flat,
        })
    }
}

fn fit_window(energy: &[f64], mu: &[f64], low: f64, high: f64) -> Option<LineFit> {
    let (x, y): (Vec<f64>, Vec<f64>) = energy
        .iter()
        .zip(mu)
        .filter(|(e, m)| **e >= low && **e <= high && m.is_finite())
        .map(|(e, m)| (*e, *m))
        .unzip();
    linear_fit(&x, &y)
}

fn fallback_len(len: usize) -> usize {
    (len / FALLBACK_FRACTION).max(2)
}

fn fit_head(energy: &[f64], mu: &[f64]) -> Option<LineFit> {
    let count = fallback_len(energy.len());
    linear_fit(&energy[..count], &mu[..count])
}

fn fit_tail(energy: &[f64], mu: &[f64]) -> Option<LineFit> {
    let start = energy.len() - fallback_len(energy.len());
    linear_fit(&energy[start..], &mu[start..])
}

fn line_error(label: &str, which: &str) -> XasError {
    XasError::computation(
        "RUN.EDGE_LINE",
        format!("could not fit the {} line for '{}'", which, label),
    )
}
