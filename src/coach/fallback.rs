//! Fallback advisor - wraps any [`FeedbackAdvisor`] and substitutes local
//! feedback on error.
//!
//! When the remote analysis fails for any reason (no key, transport, timeout,
//! bad status, unparseable or incomplete reply) [`FallbackAdvisor`] returns
//! [`local_feedback`] for the same run instead of propagating the error.

use async_trait::async_trait;

use crate::track::RunSummary;

use super::advisor::{AdvisorError, FeedbackAdvisor};
use super::feedback::{local_feedback, Feedback};

/// A wrapper around any [`FeedbackAdvisor`] that never returns an error.
///
/// ```rust
/// use stride_tracker::coach::{FallbackAdvisor, GeminiAdvisor};
/// use stride_tracker::config::AdvisorConfig;
///
/// let advisor = FallbackAdvisor::new(GeminiAdvisor::from_config(&AdvisorConfig::default()));
/// // `advisor` is safe to use with no API key or no network.
/// ```
pub struct FallbackAdvisor<A: FeedbackAdvisor> {
    inner: A,
}

impl<A: FeedbackAdvisor> FallbackAdvisor<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Infallible analysis: remote feedback when available, local otherwise.
    pub async fn feedback_for(&self, run: &RunSummary) -> Feedback {
        match self.inner.analyze(run).await {
            Ok(feedback) if feedback.is_complete() => feedback,
            Ok(_) => {
                log::warn!("advisor: remote feedback incomplete, using local feedback");
                local_feedback(run)
            }
            Err(AdvisorError::MissingApiKey) => {
                log::debug!("advisor: no API key, using local feedback");
                local_feedback(run)
            }
            Err(err) => {
                log::warn!("advisor: remote analysis failed ({err}), using local feedback");
                local_feedback(run)
            }
        }
    }
}

#[async_trait]
impl<A: FeedbackAdvisor> FeedbackAdvisor for FallbackAdvisor<A> {
    /// This implementation **never** returns `Err(_)`.
    async fn analyze(&self, run: &RunSummary) -> Result<Feedback, AdvisorError> {
        Ok(self.feedback_for(run).await)
    }

    fn set_api_key(&self, key: Option<String>) {
        self.inner.set_api_key(key);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
