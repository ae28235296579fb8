//! Uniform tool dispatch with error containment.
//!
//! Every provider interaction in a run flows through [`ProtocolGateway`]:
//! name-based lookup, per-tool timeout, and containment of provider errors
//! and panics into [`ToolCallResult::Failure`] values. The dispatch surface
//! itself never fails; only registration can.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{ToolCallRequest, ToolCallResult, ToolFailure};
use crate::domain::errors::{GatewayError, ToolErrorKind};
use crate::domain::models::TimeoutConfig;

/// A registered tool endpoint. Bindings in this module's sibling adapt the
/// typed provider ports to this uniform call shape.
#[async_trait::async_trait]
pub trait ToolProvider: Send + Sync {
    async fn call(&self, arguments: Value) -> Result<Value, ToolFailure>;
}

/// Name-keyed tool registry and dispatcher.
///
/// Registration happens once at startup; after that the gateway is shared
/// immutably (`Arc<ProtocolGateway>`) across the run.
pub struct ProtocolGateway {
    tools: HashMap<String, Arc<dyn ToolProvider>>,
    timeouts: TimeoutConfig,
}

impl ProtocolGateway {
    /// Create an empty gateway with the given timeout budgets.
    pub fn new(timeouts: TimeoutConfig) -> Self {
        Self {
            tools: HashMap::new(),
            timeouts,
        }
    }

    /// Register a provider under a unique name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn ToolProvider>,
    ) -> Result<(), GatewayError> {
        let name = name.into();
        if self.tools.contains_key(&name) {
            return Err(GatewayError::DuplicateTool(name));
        }
        self.tools.insert(name, provider);
        Ok(())
    }

    /// Names of all registered tools, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispatch one call.
    ///
    /// Unknown tools, provider errors, timeouts, and provider panics all
    /// come back as `Failure` values. The provider future runs on its own
    /// task so a panic unwinds into a join error instead of tearing down
    /// the caller.
    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolCallResult {
        let Some(provider) = self.tools.get(&request.tool_name) else {
            warn!(
                tool = %request.tool_name,
                request_id = %request.request_id,
                "dispatch to unregistered tool"
            );
            return ToolCallResult::Failure {
                kind: ToolErrorKind::UnknownTool,
                message: format!("no provider registered for tool '{}'", request.tool_name),
            };
        };

        let budget = self.timeouts.for_tool(&request.tool_name);
        debug!(
            tool = %request.tool_name,
            request_id = %request.request_id,
            timeout_secs = budget.as_secs(),
            "dispatching tool call"
        );

        let provider = Arc::clone(provider);
        let arguments = request.arguments.clone();
        let handle = tokio::spawn(async move { provider.call(arguments).await });

        let outcome = match tokio::time::timeout(budget, handle).await {
            Err(_) => Err(ToolFailure::provider(format!(
                "tool '{}' exceeded its {}s timeout",
                request.tool_name,
                budget.as_secs()
            ))),
            Ok(Err(join_error)) => Err(ToolFailure::provider(format!(
                "tool '{}' panicked: {join_error}",
                request.tool_name
            ))),
            Ok(Ok(result)) => result,
        };

        match outcome {
            Ok(content) => ToolCallResult::Success { content },
            Err(failure) => {
                warn!(
                    tool = %request.tool_name,
                    request_id = %request.request_id,
                    kind = %failure.kind,
                    message = %failure.message,
                    "tool call failed"
                );
                failure.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::gateway::types::tool_names;
    use serde_json::json;

    struct EchoProvider;

    #[async_trait::async_trait]
    impl ToolProvider for EchoProvider {
        async fn call(&self, arguments: Value) -> Result<Value, ToolFailure> {
            Ok(arguments)
        }
    }

    struct PanickingProvider;

    #[async_trait::async_trait]
    impl ToolProvider for PanickingProvider {
        async fn call(&self, _arguments: Value) -> Result<Value, ToolFailure> {
            panic!("simulated provider bug")
        }
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl ToolProvider for SlowProvider {
        async fn call(&self, _arguments: Value) -> Result<Value, ToolFailure> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(json!({}))
        }
    }

    fn gateway_with(name: &str, provider: Arc<dyn ToolProvider>) -> ProtocolGateway {
        let mut gateway = ProtocolGateway::new(TimeoutConfig::default());
        gateway.register(name, provider).unwrap();
        gateway
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let gateway = gateway_with(tool_names::TEST, Arc::new(EchoProvider));
        let result = gateway
            .dispatch(ToolCallRequest::new(tool_names::TEST, json!({"x": 1})))
            .await;
        match result {
            ToolCallResult::Success { content } => assert_eq!(content["x"], 1),
            ToolCallResult::Failure { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let gateway = ProtocolGateway::new(TimeoutConfig::default());
        let result = gateway
            .dispatch(ToolCallRequest::new("deploy", json!({})))
            .await;
        match result {
            ToolCallResult::Failure { kind, message } => {
                assert_eq!(kind, ToolErrorKind::UnknownTool);
                assert!(message.contains("deploy"));
            }
            ToolCallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let mut gateway = ProtocolGateway::new(TimeoutConfig::default());
        gateway
            .register(tool_names::GENERATE, Arc::new(EchoProvider))
            .unwrap();
        let err = gateway
            .register(tool_names::GENERATE, Arc::new(EchoProvider))
            .unwrap_err();
        assert!(matches!(err, GatewayError::DuplicateTool(name) if name == "generate"));
    }

    #[tokio::test]
    async fn test_panic_contained_as_provider_error() {
        let gateway = gateway_with(tool_names::ANALYZE, Arc::new(PanickingProvider));
        let result = gateway
            .dispatch(ToolCallRequest::new(tool_names::ANALYZE, json!({})))
            .await;
        match result {
            ToolCallResult::Failure { kind, message } => {
                assert_eq!(kind, ToolErrorKind::ProviderError);
                assert!(message.contains("panicked"));
            }
            ToolCallResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_contained_as_provider_error() {
        let gateway = gateway_with(tool_names::TEST, Arc::new(SlowProvider));
        let result = gateway
            .dispatch(ToolCallRequest::new(tool_names::TEST, json!({})))
            .await;
        match result {
            ToolCallResult::Failure { kind, message } => {
                assert_eq!(kind, ToolErrorKind::ProviderError);
                assert!(message.contains("timeout"));
            }
            ToolCallResult::Success { .. } => panic!("expected failure"),
        }
    }
}
