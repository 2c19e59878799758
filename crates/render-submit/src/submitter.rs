//! Render job submission.
//!
//! Turns a render request into a batch job and creates it with a single
//! remote call. Nothing is retried here; a caller that resubmits after a
//! timeout may end up with two jobs for the same render, since the generated
//! job id is random.

use std::sync::Arc;

use render_batch::{BatchApi, BatchClient, BatchError, Job};
use render_models::{RenderJobId, RenderRequest, SceneUri, SubmittedJob, WebhookUrl};
use tracing::Instrument;

use crate::config::SubmitterConfig;
use crate::error::{SubmitError, SubmitResult};
use crate::job_spec::{build_job, generate_job_id};
use crate::logging::JobLogger;
use crate::script::RenderScript;

const OPERATION: &str = "batch_submit";

/// Submits single-frame render jobs to the batch service.
#[derive(Clone)]
pub struct JobSubmitter {
    api: Arc<dyn BatchApi>,
    config: SubmitterConfig,
}

impl JobSubmitter {
    pub fn new(config: SubmitterConfig, api: Arc<dyn BatchApi>) -> Self {
        Self { api, config }
    }

    /// Create a submitter backed by an authenticated [`BatchClient`].
    pub async fn from_config(config: SubmitterConfig) -> SubmitResult<Self> {
        let client = BatchClient::new(config.batch.clone()).await?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Submit a render and return the provider's job name
    /// (`projects/<p>/locations/<r>/jobs/<job_id>`).
    pub async fn submit(
        &self,
        render_job_id: &str,
        scene_uri: &str,
        webhook_url: Option<&str>,
    ) -> SubmitResult<String> {
        let request = RenderRequest::new(render_job_id, scene_uri, webhook_url.map(str::to_string));
        let submitted = self.submit_request(&request).await?;
        Ok(submitted.name)
    }

    /// Submit a render request.
    ///
    /// Input is validated before anything is sent; a malformed request fails
    /// with [`SubmitError::InvalidInput`] and no remote call is made.
    pub async fn submit_request(&self, request: &RenderRequest) -> SubmitResult<SubmittedJob> {
        let render_job_id = RenderJobId::parse(request.render_job_id.as_str())?;
        let scene_uri = SceneUri::parse(&request.scene_uri)?;
        let webhook_url = request
            .webhook_url
            .as_deref()
            .map(WebhookUrl::parse)
            .transpose()?;

        let job_id = generate_job_id(&render_job_id);
        let job = self.prepare_job(&render_job_id, &scene_uri, webhook_url.as_ref());

        let logger = JobLogger::new(render_job_id.as_str(), OPERATION);
        let span = logger.create_span();

        self.create(&logger, &render_job_id, &job_id, &job)
            .instrument(span)
            .await
    }

    /// Build the job description for a validated request without sending it.
    pub fn prepare_job(
        &self,
        render_job_id: &RenderJobId,
        scene_uri: &SceneUri,
        webhook_url: Option<&WebhookUrl>,
    ) -> Job {
        let script = RenderScript::new(render_job_id, webhook_url).render();
        build_job(
            render_job_id,
            scene_uri.bucket(),
            &self.config.output_bucket,
            script,
            &self.config.profile,
        )
    }

    async fn create(
        &self,
        logger: &JobLogger,
        render_job_id: &RenderJobId,
        job_id: &str,
        job: &Job,
    ) -> SubmitResult<SubmittedJob> {
        logger.log_start(job_id, &format!("creating batch job under {}", self.api.parent()));

        let created = match self.api.create_job(job_id, job).await {
            Ok(created) => created,
            Err(e) => {
                logger.log_error(&format!("batch job {} was not created: {}", job_id, e));
                return Err(SubmitError::Submission(e));
            }
        };

        let name = created
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BatchError::invalid_response("create_job response has no job name"))?;

        logger.log_completion(&name, "batch job submitted");

        Ok(SubmittedJob {
            name,
            job_id: job_id.to_string(),
            render_job_id: render_job_id.to_string(),
            output_uri: self.config.output_uri(render_job_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use render_batch::{BatchConfig, BatchResult};

    const PARENT: &str = "projects/test-project/locations/us-central1";

    /// Records every create call and answers with a canned result.
    struct FakeBatch {
        calls: Mutex<Vec<(String, Job)>>,
        fail_with: Option<fn() -> BatchError>,
        omit_name: bool,
    }

    impl FakeBatch {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
                omit_name: false,
            })
        }

        fn failing(err: fn() -> BatchError) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(err),
                omit_name: false,
            })
        }

        fn calls(&self) -> Vec<(String, Job)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchApi for FakeBatch {
        fn parent(&self) -> String {
            PARENT.to_string()
        }

        async fn create_job(&self, job_id: &str, job: &Job) -> BatchResult<Job> {
            self.calls
                .lock()
                .unwrap()
                .push((job_id.to_string(), job.clone()));

            if let Some(err) = self.fail_with {
                return Err(err());
            }

            let mut created = job.clone();
            if !self.omit_name {
                created.name = Some(format!("{}/jobs/{}", PARENT, job_id));
            }
            Ok(created)
        }
    }

    fn submitter(api: Arc<FakeBatch>) -> JobSubmitter {
        let config = SubmitterConfig::new(BatchConfig::new("test-project", "us-central1"), "frames");
        JobSubmitter::new(config, api)
    }

    #[tokio::test]
    async fn test_submit_returns_job_name() {
        let api = FakeBatch::ok();
        let name = submitter(api.clone())
            .submit("abc123", "gs://scenes/foo.blend", None)
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        let (job_id, job) = &calls[0];

        assert!(job_id.starts_with("render-abc123-"));
        assert_eq!(name, format!("{}/jobs/{}", PARENT, job_id));

        assert_eq!(job.task_groups.len(), 1);
        let spec = &job.task_groups[0].task_spec;
        assert_eq!(spec.runnables.len(), 1);
        assert_eq!(spec.volumes.len(), 2);
        assert_eq!(spec.volumes[0].gcs.as_ref().unwrap().remote_path, "scenes");
        assert_eq!(spec.volumes[1].gcs.as_ref().unwrap().remote_path, "frames");
    }

    #[tokio::test]
    async fn test_submit_request_reports_output_location() {
        let api = FakeBatch::ok();
        let request = RenderRequest::new(
            "abc123",
            "gs://scenes/renders/abc123/abc123.blend",
            Some("https://pm.example.com/hook".to_string()),
        );

        let submitted = submitter(api.clone()).submit_request(&request).await.unwrap();
        assert_eq!(submitted.render_job_id, "abc123");
        assert_eq!(submitted.output_uri, "gs://frames/renders/abc123/");
        assert!(submitted.name.ends_with(&submitted.job_id));

        let (_, job) = &api.calls()[0];
        let script = &job.task_groups[0].task_spec.runnables[0]
            .container
            .as_ref()
            .unwrap()
            .commands[1];
        assert!(script.contains(r#"{"workflow_id": "abc123"}"#));
        assert!(script.contains("https://pm.example.com/hook"));
    }

    #[tokio::test]
    async fn test_no_webhook_means_no_callback() {
        let api = FakeBatch::ok();
        submitter(api.clone())
            .submit("abc123", "gs://scenes/foo.blend", None)
            .await
            .unwrap();

        let (_, job) = &api.calls()[0];
        let commands = &job.task_groups[0].task_spec.runnables[0]
            .container
            .as_ref()
            .unwrap()
            .commands;
        assert!(!commands[1].contains("curl"));
    }

    #[tokio::test]
    async fn test_malformed_scene_uri_fails_before_remote_call() {
        let api = FakeBatch::ok();
        let submitter = submitter(api.clone());

        for uri in ["scenes/foo.blend", "gs://", "gs://scenes", "://scenes/foo.blend"] {
            let err = submitter.submit("abc123", uri, None).await.unwrap_err();
            assert!(err.is_invalid_input(), "{uri:?} gave {err:?}");
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_render_id_and_webhook_fail_before_remote_call() {
        let api = FakeBatch::ok();
        let submitter = submitter(api.clone());

        let err = submitter
            .submit("", "gs://scenes/foo.blend", None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        let err = submitter
            .submit("abc123", "gs://scenes/foo.blend", Some("not a url"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quota_failure_propagates_cause() {
        let api = FakeBatch::failing(|| BatchError::QuotaExceeded("Quota 'CPUS' exceeded".into()));
        let err = submitter(api.clone())
            .submit("abc123", "gs://scenes/foo.blend", None)
            .await
            .unwrap_err();

        match err {
            SubmitError::Submission(BatchError::QuotaExceeded(msg)) => {
                assert_eq!(msg, "Quota 'CPUS' exceeded")
            }
            other => panic!("expected quota submission error, got {other:?}"),
        }
        assert_eq!(api.calls().len(), 1, "no retry after a failed create");
    }

    #[tokio::test]
    async fn test_missing_name_in_response_is_submission_error() {
        let api = Arc::new(FakeBatch {
            calls: Mutex::new(Vec::new()),
            fail_with: None,
            omit_name: true,
        });
        let err = submitter(api)
            .submit("abc123", "gs://scenes/foo.blend", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Submission(BatchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_prepare_job_is_pure() {
        let submitter = submitter(FakeBatch::ok());
        let id = RenderJobId::parse("abc123").unwrap();
        let scene = SceneUri::parse("gs://scenes/foo.blend").unwrap();

        let a = submitter.prepare_job(&id, &scene, None);
        let b = submitter.prepare_job(&id, &scene, None);
        assert_eq!(a, b);
    }
}
