use crate::domain::{Background, Normalization, RSpace, XafsGroup, XasResult};
use super::{AutobkParams, PreEdgeParams, XftfParams};

/// The analysis backend a batch run calls into.
///
/// Only pre-edge normalization is mandatory. Engines without background
/// removal or Fourier transforms keep the defaults, which leave those
/// stages of the group empty.
pub trait AnalysisEngine {
    fn name(&self) -> &'static str;

    fn pre_edge(&self, group: &XafsGroup, params: &PreEdgeParams) -> XasResult<Normalization>;

    fn autobk(&self, _group: &XafsGroup, _params: &AutobkParams) -> XasResult<Option<Background>> {
        Ok(None)
    }

    fn xftf(&self, _background: &Background, _params: &XftfParams) -> XasResult<Option<RSpace>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisEngine;
    use crate::domain::{Normalization, XafsGroup, XasError, XasErrorCategory, XasResult};
    use crate::engine::{AutobkParams, PreEdgeParams};

    struct FailingEngine;

    impl AnalysisEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn pre_edge(&self, _group: &XafsGroup, _params: &PreEdgeParams) -> XasResult<Normalization> {
            Err(XasError::computation("RUN.PRE_EDGE", "pre-edge failed"))
        }
    }

    #[test]
    fn engine_errors_use_shared_error_types() {
        let group = XafsGroup::new("g", vec![1.0, 2.0], vec![0.0, 1.0]).expect("group");
        let error = FailingEngine
            .pre_edge(&group, &PreEdgeParams::default())
            .expect_err("engine should fail");
        assert_eq!(error.category(), XasErrorCategory::ComputationError);
        assert_eq!(error.exit_code(), 4);
    }

    #[test]
    fn optional_stages_default_to_unavailable() {
        let group = XafsGroup::new("g", vec![1.0, 2.0], vec![0.0, 1.0]).expect("group");
        let background = FailingEngine
            .autobk(&group, &AutobkParams::default())
            .expect("default autobk should not fail");
        assert!(background.is_none());
    }
}
