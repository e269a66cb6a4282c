use std::time::Duration;

use mediagen_config::{GenerationProviderConfig, GenerationProviderType};
use mediagen_core::RequestContext;
use secrecy::SecretString;

use crate::{
    error::TaskGenError,
    poller::{PollPolicy, Poller},
    provider::{GenerationProvider, dashscope::DashscopeProvider},
    store::{PersistedTask, TaskStore},
    types::{GenerationRequest, GenerationResult, Modality, TaskHandle, TaskStatus},
};

/// Generation server that routes requests to the appropriate provider
pub struct Server {
    providers: Vec<Box<dyn GenerationProvider>>,
    policy: PollPolicy,
    store: TaskStore,
}

impl Server {
    /// Submit a generation request
    ///
    /// Routes to a provider based on the model name in the request.
    /// Model format: "provider/model" (e.g. "tongyi/wanx-v1").
    /// If no provider prefix, uses the first configured provider.
    /// A snapshot of the new task is persisted for resume-after-reload.
    pub async fn submit(
        &self,
        request: &GenerationRequest,
        context: &RequestContext,
    ) -> crate::error::Result<TaskHandle> {
        let provider = self.provider_for_model(&request.model)?;
        let handle = provider.submit(request, context).await?;

        self.store.save(PersistedTask::from_submission(request, handle.clone()));

        Ok(handle)
    }

    /// Issue a single status check for a task
    pub async fn poll_once(
        &self,
        handle: &TaskHandle,
        context: &RequestContext,
    ) -> crate::error::Result<TaskStatus> {
        self.poll_task(&handle.provider, &handle.task_id, context).await
    }

    /// Issue a single status check by provider name and task id
    pub async fn poll_task(
        &self,
        provider: &str,
        task_id: &str,
        context: &RequestContext,
    ) -> crate::error::Result<TaskStatus> {
        self.provider_named(provider)?.poll(task_id, context).await
    }

    /// Poll a task to its terminal outcome under the configured budget
    ///
    /// The stored snapshot for the task's modality is kept in step with the
    /// loop's lifecycle state.
    pub async fn await_result(
        &self,
        handle: &TaskHandle,
        modality: Modality,
        context: &RequestContext,
    ) -> crate::error::Result<GenerationResult> {
        let provider = self.provider_named(&handle.provider)?;

        let mut poller = Poller::new(provider, self.policy);
        let outcome = poller.run(handle, context).await;

        self.store.update_state(handle, modality, poller.state());

        outcome
    }

    /// Submit and wait for the terminal result in one call (embedded use)
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        context: &RequestContext,
    ) -> crate::error::Result<GenerationResult> {
        let handle = self.submit(request, context).await?;
        self.await_result(&handle, request.modality, context).await
    }

    /// Load the resumable task snapshot for a modality, if any
    ///
    /// Fresh non-terminal snapshots come back in `Polling` state; feeding
    /// the contained handle to [`Self::await_result`] continues the loop
    /// without a duplicate submission.
    pub fn resume(&self, modality: Modality) -> Option<PersistedTask> {
        self.store.load(modality)
    }

    /// Access the underlying task store
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    fn provider_for_model(&self, model: &str) -> crate::error::Result<&dyn GenerationProvider> {
        let (provider_name, _model_name) = model.split_once('/').unwrap_or(("", model));

        if provider_name.is_empty() {
            return self.providers.first().map(|p| p.as_ref()).ok_or_else(|| {
                TaskGenError::ProviderNotFound("No generation providers configured".to_string())
            });
        }

        self.provider_named(provider_name)
    }

    fn provider_named(&self, name: &str) -> crate::error::Result<&dyn GenerationProvider> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
            .ok_or_else(|| TaskGenError::ProviderNotFound(name.to_string()))
    }
}

/// Builder for constructing the generation server from configuration
pub struct GenServerBuilder<'a> {
    config: &'a mediagen_config::Config,
}

impl<'a> GenServerBuilder<'a> {
    pub fn new(config: &'a mediagen_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> crate::error::Result<Server> {
        let mut providers: Vec<Box<dyn GenerationProvider>> = Vec::new();

        for (name, provider_config) in &self.config.generation.providers {
            tracing::debug!("Initializing generation provider: {name}");

            let provider: Box<dyn GenerationProvider> = match &provider_config.provider_type {
                GenerationProviderType::Dashscope => {
                    let api_key = resolve_api_key(name, provider_config)?;

                    Box::new(DashscopeProvider::new(
                        name.clone(),
                        api_key,
                        provider_config.base_url.as_ref().map(|url| url.as_str().to_string()),
                        provider_config.image_sizes.clone(),
                        provider_config.video_resolutions.clone(),
                        provider_config.fallbacks.clone(),
                    ))
                }
            };

            providers.push(provider);
        }

        tracing::debug!("Generation server initialized with {} provider(s)", providers.len());

        let polling = &self.config.generation.polling;

        Ok(Server {
            providers,
            policy: PollPolicy::from_config(polling),
            store: TaskStore::new(Duration::from_secs(polling.staleness_minutes * 60)),
        })
    }
}

fn resolve_api_key(name: &str, config: &GenerationProviderConfig) -> crate::error::Result<SecretString> {
    config.api_key.clone().ok_or_else(|| {
        TaskGenError::ConfigError(format!("API key required for generation provider '{name}'"))
    })
}
