use std::sync::Arc;

use crate::database::Store;
use crate::error::{Error, Result};
use crate::models::{
    application::ApplicationStatus,
    evaluation::{Evaluation, NewEvaluation},
};

/// Inclusive score range accepted by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBounds {
    pub min: i32,
    pub max: i32,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

impl ScoreBounds {
    pub fn check(&self, score: i32) -> Result<()> {
        if (self.min..=self.max).contains(&score) {
            Ok(())
        } else {
            Err(Error::InvalidScore {
                score,
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[derive(Clone)]
pub struct EvaluationService {
    store: Arc<dyn Store>,
    bounds: ScoreBounds,
}

impl EvaluationService {
    pub fn new(store: Arc<dyn Store>, bounds: ScoreBounds) -> Self {
        Self { store, bounds }
    }

    /// One evaluation per application; recording again overwrites the previous one.
    pub async fn record_evaluation(
        &self,
        application_id: i64,
        score: i32,
        comments: Option<String>,
    ) -> Result<Evaluation> {
        let application = self
            .store
            .find_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", application_id)))?;
        self.bounds.check(score)?;
        if application.status == ApplicationStatus::Submitted {
            return Err(Error::InvalidTransition(
                "an application must be reviewed before it can be evaluated".to_string(),
            ));
        }

        let evaluation = self
            .store
            .upsert_evaluation(NewEvaluation {
                application_id,
                score,
                comments,
            })
            .await?;
        tracing::info!(
            application_id,
            score,
            status = %application.status,
            "evaluation recorded"
        );
        Ok(evaluation)
    }

    pub async fn find(&self, application_id: i64) -> Result<Option<Evaluation>> {
        self.store.find_evaluation(application_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_cover_zero_to_hundred() {
        let bounds = ScoreBounds::default();
        assert!(bounds.check(0).is_ok());
        assert!(bounds.check(100).is_ok());
        assert!(matches!(
            bounds.check(-1),
            Err(Error::InvalidScore { score: -1, .. })
        ));
        assert!(matches!(
            bounds.check(101),
            Err(Error::InvalidScore { score: 101, .. })
        ));
    }
}
