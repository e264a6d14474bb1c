//! Analysis engine seam.
//!
//! An [`AnalysisSession`] is created once per run and borrowed by every
//! stage that needs the engine; nothing here is process-global.

mod edge_step;
mod traits;

pub use edge_step::EdgeStepEngine;
pub use traits::AnalysisEngine;

use crate::domain::{XafsGroup, XasResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use tracing::debug;

/// Pre-edge line windows, in eV relative to e0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreEdgeParams {
    pub e0: Option<f64>,
    pub pre1: f64,
    pub pre2: f64,
    pub norm1: f64,
    pub norm2: f64,
}

impl Default for PreEdgeParams {
    fn default() -> Self {
        Self {
            e0: None,
            pre1: -200.0,
            pre2: -30.0,
            norm1: 150.0,
            norm2: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutobkParams {
    pub rbkg: f64,
    pub kweight: f64,
}

impl Default for AutobkParams {
    fn default() -> Self {
        Self {
            rbkg: 1.0,
            kweight: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KWindow {
    Hanning,
    Parzen,
    Welch,
    Gaussian,
    Sine,
    Kaiser,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XftfParams {
    pub kweight: f64,
    pub kmin: f64,
    pub kmax: f64,
    pub dk: f64,
    pub window: KWindow,
}

impl Default for XftfParams {
    fn default() -> Self {
        Self {
            kweight: 0.5,
            kmin: 3.0,
            kmax: 12.871,
            dk: 1.0,
            window: KWindow::Hanning,
        }
    }
}

/// Engine handle plus the parameters applied to every group of a run.
pub struct AnalysisSession {
    engine: Box<dyn AnalysisEngine>,
    pub pre_edge: PreEdgeParams,
    pub autobk: AutobkParams,
    pub xftf: XftfParams,
}

impl AnalysisSession {
    pub fn new(engine: Box<dyn AnalysisEngine>) -> Self {
        Self {
            engine,
            pre_edge: PreEdgeParams::default(),
            autobk: AutobkParams::default(),
            xftf: XftfParams::default(),
        }
    }

    pub fn engine(&self) -> &dyn AnalysisEngine {
        self.engine.as_ref()
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(Box::new(EdgeStepEngine))
    }
}

impl Debug for AnalysisSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("engine", &self.engine.name())
            .field("pre_edge", &self.pre_edge)
            .field("autobk", &self.autobk)
            .field("xftf", &self.xftf)
            .finish()
    }
}

/// Runs normalization, background removal and the forward transform with
/// the session defaults, replacing any earlier stage output.
pub fn calc_with_defaults(session: &AnalysisSession, group: &mut XafsGroup) -> XasResult<()> {
    let engine = session.engine();

    group.normalization = Some(engine.pre_edge(group, &session.pre_edge)?);
    group.background = engine.autobk(group, &session.autobk)?;
    group.transform = match &group.background {
        Some(background) => engine.xftf(background, &session.xftf)?,
        None => None,
    };

    debug!(
        label = %group.label,
        engine = engine.name(),
        background = group.background.is_some(),
        transform = group.transform.is_some(),
        "analysis stages complete"
    );
    Ok(())
}
