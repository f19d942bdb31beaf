use std::sync::Arc;

use strand_core::model::{AssessmentId, Progress, StrandResults};

use crate::api::AssessmentApi;
use crate::auth_service::AuthService;
use crate::error::{ApiError, DashboardError};

/// What the dashboard home shows for the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardOverview {
    NotStarted,
    InProgress {
        assessment_id: AssessmentId,
        progress: Progress,
    },
    Completed {
        assessment_id: AssessmentId,
        results: StrandResults,
    },
}

impl DashboardOverview {
    /// Retake is only offered once an attempt exists.
    #[must_use]
    pub fn retake_target(&self) -> Option<AssessmentId> {
        match self {
            Self::NotStarted => None,
            Self::InProgress { assessment_id, .. } | Self::Completed { assessment_id, .. } => {
                Some(*assessment_id)
            }
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    api: Arc<dyn AssessmentApi>,
    auth: Arc<AuthService>,
}

impl DashboardService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, auth: Arc<AuthService>) -> Self {
        Self { api, auth }
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Auth` without a stored token,
    /// `DashboardError::NoActiveDataset` when nothing is active, and
    /// `DashboardError::Api` for backend failures.
    pub async fn overview(&self) -> Result<DashboardOverview, DashboardError> {
        let token = self.auth.require_token().await?;
        let user = self.api.current_user(&token).await?;
        let data_set = self
            .api
            .active_dataset(&token)
            .await?
            .data_set_id
            .ok_or(DashboardError::NoActiveDataset)?;

        let Some(existing) = self
            .api
            .existing_assessment(&token, user, data_set)
            .await?
        else {
            return Ok(DashboardOverview::NotStarted);
        };

        let assessment_id = existing.assessment_id;
        if !existing.completed {
            return Ok(DashboardOverview::InProgress {
                assessment_id,
                progress: existing.progress,
            });
        }

        match self.api.results(&token, assessment_id).await {
            Ok(results) => Ok(DashboardOverview::Completed {
                assessment_id,
                results,
            }),
            // Graded results can lag the completed flag.
            Err(ApiError::Locked) => Ok(DashboardOverview::InProgress {
                assessment_id,
                progress: Progress::COMPLETE,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the attempt so the next visit starts from the pre-survey.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError` if there is no token or the delete fails.
    pub async fn retake(&self, assessment_id: AssessmentId) -> Result<(), DashboardError> {
        let token = self.auth.require_token().await?;
        self.api.delete_assessment(&token, assessment_id).await?;
        tracing::info!(assessment = %assessment_id, "assessment deleted from dashboard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryAssessmentApi;
    use storage::repository::{Storage, TokenRecord};
    use strand_core::Clock;
    use strand_core::model::{DataSetId, Strand, TokenScope, UserId};
    use strand_core::time::fixed_now;

    async fn service(api: &InMemoryAssessmentApi) -> DashboardService {
        let storage = Storage::in_memory();
        let token = api.issue_token(UserId::new(1)).unwrap();
        storage
            .session
            .save_token(&TokenRecord::new(token, TokenScope::Session, fixed_now()))
            .await
            .unwrap();
        let auth = Arc::new(AuthService::new(Clock::fixed(fixed_now()), storage));
        DashboardService::new(Arc::new(api.clone()), auth)
    }

    #[tokio::test]
    async fn overview_follows_the_attempt_lifecycle() {
        let api = InMemoryAssessmentApi::demo();
        let dashboard = service(&api).await;
        assert_eq!(
            dashboard.overview().await.unwrap(),
            DashboardOverview::NotStarted
        );

        let id = api.seed_attempt(UserId::new(1), DataSetId::new(1), Some(false), None, &[]);
        assert!(matches!(
            dashboard.overview().await.unwrap(),
            DashboardOverview::InProgress { assessment_id, .. } if assessment_id == id
        ));

        let token = api.issue_token(UserId::new(1)).unwrap();
        api.submit(&token, id).await.unwrap();
        let DashboardOverview::Completed { results, .. } = dashboard.overview().await.unwrap()
        else {
            panic!("expected completed overview");
        };
        assert_eq!(results.recommended_strand, Strand::Stem);
    }

    #[tokio::test]
    async fn dashboard_retake_deletes_the_attempt() {
        let api = InMemoryAssessmentApi::demo();
        let dashboard = service(&api).await;
        let id = api.seed_attempt(UserId::new(1), DataSetId::new(1), Some(true), None, &[]);

        let overview = dashboard.overview().await.unwrap();
        dashboard
            .retake(overview.retake_target().unwrap())
            .await
            .unwrap();
        assert!(!api.attempt_exists(id));
        assert_eq!(
            dashboard.overview().await.unwrap(),
            DashboardOverview::NotStarted
        );
    }
}
