//! Pickup-line submission review

use shared_types::{PickupLineSubmission, ReviewSubmissionRequest};

use crate::api::ConsoleApi;
use crate::error::{ApiError, ConsoleError};
use crate::notify::{Notice, NoticeQueue};
use crate::session::Session;

/// A rejection the operator still has to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReject {
    pub submission_id: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct ModerationController {
    submissions: Vec<PickupLineSubmission>,
    loading: bool,
    load_error: Option<String>,
    reviewing: Option<String>,
    pending_reject: Option<PendingReject>,
    notices: NoticeQueue,
}

impl ModerationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> &[PickupLineSubmission] {
        &self.submissions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Submission whose review is in flight
    pub fn reviewing(&self) -> Option<&str> {
        self.reviewing.as_deref()
    }

    pub fn pending_reject(&self) -> Option<&PendingReject> {
        self.pending_reject.as_ref()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn begin_load(&mut self) -> Result<(), ConsoleError> {
        if self.loading {
            return Err(ConsoleError::Busy);
        }
        self.loading = true;
        Ok(())
    }

    pub fn finish_load(&mut self, result: Result<Vec<PickupLineSubmission>, ApiError>) -> Result<(), ConsoleError> {
        self.loading = false;
        match result {
            Ok(submissions) => {
                tracing::info!(count = submissions.len(), "Pending submissions loaded");
                self.submissions = submissions;
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load submissions");
                self.load_error = Some(e.to_string());
                Err(ConsoleError::Fetch(e))
            }
        }
    }

    pub async fn load(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        self.begin_load()?;
        let result = api.list_submissions(session).await;
        self.finish_load(result)
    }

    fn find(&self, submission_id: &str) -> Result<&PickupLineSubmission, ConsoleError> {
        self.submissions
            .iter()
            .find(|submission| submission.id == submission_id)
            .ok_or_else(|| ConsoleError::UnknownEntry {
                field: "submissions",
                id: submission_id.to_string(),
            })
    }

    fn begin_review(&mut self, submission_id: &str, is_accepted: bool) -> Result<ReviewSubmissionRequest, ConsoleError> {
        if self.reviewing.is_some() {
            return Err(ConsoleError::Busy);
        }
        self.find(submission_id)?;
        self.reviewing = Some(submission_id.to_string());
        Ok(ReviewSubmissionRequest {
            submission_id: submission_id.to_string(),
            is_accepted,
        })
    }

    /// Approvals go out without confirmation.
    pub fn begin_approve(&mut self, submission_id: &str) -> Result<ReviewSubmissionRequest, ConsoleError> {
        self.begin_review(submission_id, true)
    }

    /// First step of a rejection. Nothing is sent until [`Self::begin_reject`].
    pub fn request_reject(&mut self, submission_id: &str) -> Result<(), ConsoleError> {
        let submission = self.find(submission_id)?;
        self.pending_reject = Some(PendingReject {
            submission_id: submission.id.clone(),
            text: submission.text.clone(),
        });
        Ok(())
    }

    pub fn dismiss_reject(&mut self) {
        self.pending_reject = None;
    }

    pub fn begin_reject(&mut self) -> Result<ReviewSubmissionRequest, ConsoleError> {
        let pending = self.pending_reject.take().ok_or(ConsoleError::NothingToConfirm)?;
        match self.begin_review(&pending.submission_id, false) {
            Ok(request) => Ok(request),
            Err(e) => {
                self.pending_reject = Some(pending);
                Err(e)
            }
        }
    }

    /// A reviewed submission leaves the list without a re-fetch.
    pub fn finish_review(&mut self, request: &ReviewSubmissionRequest, result: Result<(), ApiError>) -> Result<(), ConsoleError> {
        self.reviewing = None;
        let verdict = if request.is_accepted { "approved" } else { "rejected" };
        match result {
            Ok(()) => {
                tracing::info!(id = %request.submission_id, verdict, "Submission reviewed");
                self.submissions
                    .retain(|submission| submission.id != request.submission_id);
                self.notices.success(format!("Submission {verdict}"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = %request.submission_id, error = %e, "Failed to review submission");
                self.notices.error(format!("Failed to review submission: {e}"));
                Err(ConsoleError::Action(e))
            }
        }
    }

    pub async fn approve(&mut self, api: &dyn ConsoleApi, session: &Session, submission_id: &str) -> Result<(), ConsoleError> {
        let request = self.begin_approve(submission_id)?;
        let result = api.review_submission(session, &request).await;
        self.finish_review(&request, result)
    }

    pub async fn confirm_reject(&mut self, api: &dyn ConsoleApi, session: &Session) -> Result<(), ConsoleError> {
        let request = self.begin_reject()?;
        let result = api.review_submission(session, &request).await;
        self.finish_review(&request, result)
    }
}
