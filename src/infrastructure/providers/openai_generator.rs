//! Chat-completions Generator provider.
//!
//! HTTP generator backed by an OpenAI-compatible chat-completions endpoint.
//! Requests are rate limited with a token bucket and retried with
//! exponential backoff on transient failures (429 and 5xx); client errors
//! are permanent and fail the call immediately.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::models::{
    AnalysisOutcome, GeneratorConfig, Implementation, RateLimitConfig, RetryConfig, Specification,
    TestOutcome,
};
use crate::domain::ports::Generator;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Generator provider speaking the chat-completions wire protocol.
pub struct OpenAiGenerator {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
    framework: String,
    rate_limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl OpenAiGenerator {
    /// Build a generator from configuration. The API key is read from the
    /// environment variable the config names; it never lives in config files.
    pub fn from_config(
        config: &GeneratorConfig,
        rate_limit: &RateLimitConfig,
        retry: &RetryConfig,
    ) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!("generator API key not found in ${}", config.api_key_env)
        })?;
        Self::new(config, rate_limit, retry, api_key)
    }

    /// Build a generator with an explicit API key (used by tests against a
    /// local mock endpoint).
    pub fn new(
        config: &GeneratorConfig,
        rate_limit: &RateLimitConfig,
        retry: &RetryConfig,
        api_key: String,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(rate_limit.requests_per_second.ceil().max(1.0) as u32)
            .unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(rate_limit.burst_size.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            framework: config.framework.clone(),
            rate_limiter: RateLimiter::direct(quota),
            retry: retry.clone(),
        })
    }

    async fn complete(&self, system: String, user: String) -> Result<Implementation> {
        self.rate_limiter.until_ready().await;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(Some(Duration::from_millis(
                self.retry.max_backoff_ms * u64::from(self.retry.max_retries + 1),
            )))
            .build();

        let content = backoff::future::retry(policy, || async {
            self.send_request(&request).await.map_err(classify)
        })
        .await?;

        parse_generated(&content, &self.framework)
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .context("failed to send generator request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(HttpStatusError { status, body }.into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse generator response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("generator response contained no choices"))?;
        Ok(choice.message.content)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    #[instrument(skip_all, fields(scenarios = specification.scenarios.len()))]
    async fn generate(&self, specification: &Specification) -> Result<Implementation> {
        debug!(framework = %self.framework, "requesting initial implementation");
        self.complete(
            system_prompt(&self.framework),
            generate_prompt(specification),
        )
        .await
    }

    #[instrument(skip_all, fields(target = target_quality_score))]
    async fn refine(
        &self,
        current: &Implementation,
        test_outcome: &TestOutcome,
        analysis_outcome: &AnalysisOutcome,
        target_quality_score: f64,
    ) -> Result<Implementation> {
        debug!(files = current.source_files.len(), "requesting refinement");
        self.complete(
            system_prompt(&self.framework),
            refine_prompt(current, test_outcome, analysis_outcome, target_quality_score),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Wire types and error classification
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, thiserror::Error)]
#[error("generator endpoint returned {status}: {body}")]
struct HttpStatusError {
    status: StatusCode,
    body: String,
}

/// Retry on rate limiting and server errors; everything else is permanent.
fn classify(error: anyhow::Error) -> backoff::Error<anyhow::Error> {
    let transient = match error.downcast_ref::<HttpStatusError>() {
        Some(http) => {
            http.status == StatusCode::TOO_MANY_REQUESTS || http.status.is_server_error()
        }
        // Network-level failures (connect, timeout) are transient.
        None => error.downcast_ref::<reqwest::Error>().is_some()
            || error
                .chain()
                .any(|cause| cause.downcast_ref::<reqwest::Error>().is_some()),
    };
    if transient {
        warn!(error = %error, "transient generator failure, will retry");
        backoff::Error::transient(error)
    } else {
        backoff::Error::permanent(error)
    }
}

// ---------------------------------------------------------------------------
// Prompt construction and output parsing
// ---------------------------------------------------------------------------

fn system_prompt(framework: &str) -> String {
    format!(
        "You are a code generator targeting the {framework} framework. \
         Respond with a single JSON object of the form \
         {{\"files\": {{\"<filename>\": \"<content>\"}}, \"dependencies\": [\"<package>\"]}} \
         and nothing else. Every file must be complete and runnable."
    )
}

fn generate_prompt(specification: &Specification) -> String {
    let mut prompt = String::from("Implement a service satisfying these scenarios:\n");
    for scenario in &specification.scenarios {
        prompt.push_str(&format!(
            "- {}: given {}, when {}, then {}\n",
            scenario.name, scenario.given, scenario.when, scenario.then
        ));
    }
    if specification.constraint_count() > 0 {
        prompt.push_str("Non-functional constraints:\n");
        for (category, constraints) in &specification.constraints {
            for constraint in constraints {
                prompt.push_str(&format!(
                    "- [{category}] {}: {}\n",
                    constraint.name, constraint.requirement
                ));
            }
        }
    }
    prompt.push_str("Include unit tests for every scenario.");
    prompt
}

fn refine_prompt(
    current: &Implementation,
    test_outcome: &TestOutcome,
    analysis_outcome: &AnalysisOutcome,
    target_quality_score: f64,
) -> String {
    let mut prompt = format!(
        "Improve the implementation below to reach a quality score of {target_quality_score}. \
         Return the complete revised file set.\n\nCurrent files:\n"
    );
    for (name, content) in &current.source_files {
        prompt.push_str(&format!("--- {name} ---\n{content}\n"));
    }
    prompt.push_str(&format!(
        "\nTest results: syntax_valid={}, dependencies_resolved={}, passed={}, failed={}\n",
        test_outcome.syntax_valid,
        test_outcome.dependencies_resolved,
        test_outcome.unit_test_results.passed,
        test_outcome.unit_test_results.failed,
    ));
    for failure in &test_outcome.unit_test_results.failures {
        prompt.push_str(&format!("- failed {}: {}\n", failure.test_name, failure.message));
    }
    for issue in &test_outcome.lint_issues {
        prompt.push_str(&format!("- lint [{}] {}\n", issue.location, issue.message));
    }
    for issue in &analysis_outcome.detected_issues {
        prompt.push_str(&format!(
            "- analysis: {} (fix: {})\n",
            issue.description, issue.suggested_fix
        ));
    }
    prompt
}

#[derive(Debug, Deserialize)]
struct GeneratedPayload {
    #[serde(default)]
    files: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Parse the model's JSON payload into an [`Implementation`], tolerating a
/// surrounding markdown code fence.
fn parse_generated(content: &str, framework: &str) -> Result<Implementation> {
    let trimmed = strip_code_fence(content);
    let payload: GeneratedPayload = serde_json::from_str(trimmed)
        .with_context(|| "generator returned content that is not the expected JSON shape")?;

    let mut implementation = Implementation::new(framework);
    for (name, body) in payload.files {
        implementation = implementation.with_file(name, body);
    }
    for dependency in payload.dependencies {
        implementation = implementation.with_dependency(dependency);
    }
    if !implementation.has_usable_content() {
        return Err(anyhow!("generator returned no usable source files"));
    }
    Ok(implementation)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_start().strip_suffix("```").unwrap_or(inner).trim()
}
