//! SVG diagnostic figures.

use crate::domain::{XafsGroup, XasError, XasResult};
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const FIGURE_SIZE: (u32, u32) = (1200, 900);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 18);
const CHI_KWEIGHT: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    fn new(label: impl Into<String>, x: &[f64], y: &[f64]) -> Self {
        Self {
            label: label.into(),
            points: x
                .iter()
                .zip(y)
                .map(|(&x, &y)| (x, y))
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    pub series: Vec<Series>,
}

/// Panels for one group: mu with the edge lines, normalized mu, and chi(k)
/// and |chi(R)| when those stages ran.
pub fn group_panels(group: &XafsGroup) -> Vec<Panel> {
    let mut mu_series = vec![Series::new(&group.label, &group.energy, &group.mu)];
    if let Some(normalization) = &group.normalization {
        mu_series.push(Series::new("pre-edge", &group.energy, &normalization.pre_edge));
        mu_series.push(Series::new("post-edge", &group.energy, &normalization.post_edge));
    }

    let mut panels = vec![Panel {
        title: format!("{} mu(E)", group.label),
        x_desc: "Energy (eV)",
        y_desc: "mu(E)",
        series: mu_series,
    }];

    if let Some(normalization) = &group.normalization {
        panels.push(Panel {
            title: "normalised and flattened mu(E)".to_string(),
            x_desc: "Energy (eV)",
            y_desc: "normalised mu(E)",
            series: vec![
                Series::new("norm", &group.energy, &normalization.norm),
                Series::new("flat", &group.energy, &normalization.flat),
            ],
        });
    }

    if let Some(background) = &group.background {
        let weighted: Vec<f64> = background
            .k
            .iter()
            .zip(&background.chi)
            .map(|(k, chi)| chi * k.powi(CHI_KWEIGHT))
            .collect();
        panels.push(Panel {
            title: format!("{} in k space", group.label),
            x_desc: "k (1/Angstrom)",
            y_desc: "k^2 chi(k)",
            series: vec![Series::new(&group.label, &background.k, &weighted)],
        });
    }

    if let Some(transform) = &group.transform {
        panels.push(Panel {
            title: format!("{} in R space", group.label),
            x_desc: "R (Angstrom)",
            y_desc: "|chi(R)|",
            series: vec![Series::new(&group.label, &transform.r, &transform.chir_mag)],
        });
    }

    panels
}

/// One panel overlaying every member and the merged series.
pub fn merge_panel(members: &[XafsGroup], merged: &XafsGroup) -> Panel {
    let curve = |group: &XafsGroup| {
        let y = group.norm().unwrap_or(&group.mu);
        Series::new(&group.label, &group.energy, y)
    };

    let mut series: Vec<Series> = members.iter().map(curve).collect();
    series.push(curve(merged));

    Panel {
        title: format!("{} merged", merged.label),
        x_desc: "Energy (eV)",
        y_desc: "normalised mu(E)",
        series,
    }
}

pub fn plot_group(path: &Path, group: &XafsGroup) -> XasResult<()> {
    render_panels(path, &group_panels(group))
}

pub fn plot_merge(path: &Path, members: &[XafsGroup], merged: &XafsGroup) -> XasResult<()> {
    render_panels(path, &[merge_panel(members, merged)])
}

fn grid_shape(count: usize) -> (usize, usize) {
    match count {
        0 | 1 => (1, 1),
        2 => (2, 1),
        _ => (2, 2),
    }
}

pub fn render_panels(path: &Path, panels: &[Panel]) -> XasResult<()> {
    let plot_error = |source: &dyn std::fmt::Display| {
        XasError::io_system(
            "IO.PLOT_RENDER",
            format!("failed to render '{}': {}", path.display(), source),
        )
    };

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_error(&e))?;

    let areas = root.split_evenly(grid_shape(panels.len()));
    for (area, panel) in areas.iter().zip(panels) {
        let (x_range, y_range) = panel_ranges(panel);
        let mut chart = ChartBuilder::on(area)
            .caption(&panel.title, CAPTION_FONT)
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| plot_error(&e))?;

        chart
            .configure_mesh()
            .x_desc(panel.x_desc)
            .y_desc(panel.y_desc)
            .draw()
            .map_err(|e| plot_error(&e))?;

        for (index, series) in panel.series.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(|e| plot_error(&e))?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| plot_error(&e))?;
    }

    root.present().map_err(|e| plot_error(&e))
}

fn panel_ranges(panel: &Panel) -> (Range<f64>, Range<f64>) {
    let points = panel.series.iter().flat_map(|series| series.points.iter());
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    (padded(x_min, x_max, 0.0), padded(y_min, y_max, 0.05))
}

fn padded(min: f64, max: f64, fraction: f64) -> Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * fraction;
    (min - pad)..(max + pad)
}

#[cfg(test)]
mod tests {
    use super::{grid_shape, group_panels, merge_panel, padded, plot_group};
    use crate::domain::{Background, Normalization, XafsGroup};
    use std::fs;
    use tempfile::TempDir;

    fn group() -> XafsGroup {
        XafsGroup::new("fe", vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.1, 1.0, 1.1]).expect("group")
    }

    #[test]
    fn raw_group_has_only_the_mu_panel() {
        let panels = group_panels(&group());
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].series.len(), 1);
    }

    #[test]
    fn stage_outputs_add_panels() {
        let mut group = group();
        group.normalization = Some(Normalization {
            e0: 2.5,
            edge_step: 1.0,
            pre_edge: vec![0.0; 4],
            post_edge: vec![1.0; 4],
            norm: vec![0.0, 0.1, 1.0, 1.1],
            flat: vec![0.0, 0.1, 1.0, 1.0],
        });
        group.background = Some(Background {
            bkg: vec![0.0; 4],
            k: vec![1.0, 2.0],
            chi: vec![0.5, f64::NAN],
        });

        let panels = group_panels(&group);
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].series.len(), 3);
        // NaN samples are dropped rather than drawn.
        assert_eq!(panels[2].series[0].points, [(1.0, 0.5)]);
    }

    #[test]
    fn merge_panel_falls_back_to_mu() {
        let member = group();
        let merged = member.relabeled("merged");
        let panel = merge_panel(std::slice::from_ref(&member), &merged);
        assert_eq!(panel.series.len(), 2);
        assert_eq!(panel.series[1].label, "merged");
        assert_eq!(panel.series[1].points[2], (3.0, 1.0));
    }

    #[test]
    fn degenerate_ranges_are_widened() {
        assert_eq!(padded(2.0, 2.0, 0.1), 1.5..2.5);
        assert_eq!(padded(f64::INFINITY, f64::NEG_INFINITY, 0.1), 0.0..1.0);
        assert_eq!(grid_shape(3), (2, 2));
    }

    #[test]
    fn figure_is_written_as_svg() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("fe.svg");
        plot_group(&path, &group()).expect("plot");
        let content = fs::read_to_string(&path).expect("svg readable");
        assert!(content.contains("<svg"));
    }
}
