//! Typed bindings between the provider ports and the gateway's uniform
//! call shape.
//!
//! Each binding decodes the tool's argument struct, invokes the typed port,
//! and re-encodes the result as JSON. `GatewayClient` is the reverse
//! direction: a typed facade the orchestrator calls, with every invocation
//! still travelling through `ProtocolGateway::dispatch`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::dispatcher::{ProtocolGateway, ToolProvider};
use super::types::{tool_names, ToolCallRequest, ToolCallResult, ToolFailure};
use crate::domain::errors::GatewayError;
use crate::domain::models::{AnalysisOutcome, Implementation, Specification, TestOutcome};
use crate::domain::ports::{
    AnalyzeArgs, Analyzer, GenerateArgs, Generator, PackageArgs, Packager, RefineArgs, TestArgs,
    Tester,
};

fn decode_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolFailure> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolFailure::invalid_arguments(format!("argument decoding failed: {e}")))
}

fn encode_result<T: Serialize>(value: &T) -> Result<Value, ToolFailure> {
    serde_json::to_value(value)
        .map_err(|e| ToolFailure::provider(format!("result encoding failed: {e}")))
}

// ---------------------------------------------------------------------------
// Provider -> tool bindings
// ---------------------------------------------------------------------------

pub struct GenerateBinding(pub Arc<dyn Generator>);

#[async_trait::async_trait]
impl ToolProvider for GenerateBinding {
    async fn call(&self, arguments: Value) -> Result<Value, ToolFailure> {
        let args: GenerateArgs = decode_args(arguments)?;
        let implementation = self
            .0
            .generate(&args.specification)
            .await
            .map_err(|e| ToolFailure::provider(format!("{e:#}")))?;
        encode_result(&implementation)
    }
}

pub struct RefineBinding(pub Arc<dyn Generator>);

#[async_trait::async_trait]
impl ToolProvider for RefineBinding {
    async fn call(&self, arguments: Value) -> Result<Value, ToolFailure> {
        let args: RefineArgs = decode_args(arguments)?;
        let implementation = self
            .0
            .refine(
                &args.current_implementation,
                &args.test_outcome,
                &args.analysis_outcome,
                args.target_quality_score,
            )
            .await
            .map_err(|e| ToolFailure::provider(format!("{e:#}")))?;
        encode_result(&implementation)
    }
}

pub struct TestBinding(pub Arc<dyn Tester>);

#[async_trait::async_trait]
impl ToolProvider for TestBinding {
    async fn call(&self, arguments: Value) -> Result<Value, ToolFailure> {
        let args: TestArgs = decode_args(arguments)?;
        let outcome = self
            .0
            .run(&args.implementation)
            .await
            .map_err(|e| ToolFailure::provider(format!("{e:#}")))?;
        encode_result(&outcome)
    }
}

pub struct AnalyzeBinding(pub Arc<dyn Analyzer>);

#[async_trait::async_trait]
impl ToolProvider for AnalyzeBinding {
    async fn call(&self, arguments: Value) -> Result<Value, ToolFailure> {
        let args: AnalyzeArgs = decode_args(arguments)?;
        let outcome = self
            .0
            .analyze(&args.implementation)
            .await
            .map_err(|e| ToolFailure::provider(format!("{e:#}")))?;
        encode_result(&outcome)
    }
}

pub struct PackageBinding(pub Arc<dyn Packager>);

#[async_trait::async_trait]
impl ToolProvider for PackageBinding {
    async fn call(&self, arguments: Value) -> Result<Value, ToolFailure> {
        let args: PackageArgs = decode_args(arguments)?;
        self.0
            .package(&args.implementation)
            .await
            .map_err(|e| ToolFailure::provider(format!("{e:#}")))
    }
}

/// Register the standard five tools on a gateway.
pub fn register_standard_tools(
    gateway: &mut ProtocolGateway,
    generator: Arc<dyn Generator>,
    tester: Arc<dyn Tester>,
    analyzer: Arc<dyn Analyzer>,
    packager: Arc<dyn Packager>,
) -> Result<(), GatewayError> {
    gateway.register(
        tool_names::GENERATE,
        Arc::new(GenerateBinding(Arc::clone(&generator))),
    )?;
    gateway.register(tool_names::REFINE, Arc::new(RefineBinding(generator)))?;
    gateway.register(tool_names::TEST, Arc::new(TestBinding(tester)))?;
    gateway.register(tool_names::ANALYZE, Arc::new(AnalyzeBinding(analyzer)))?;
    gateway.register(tool_names::PACKAGE, Arc::new(PackageBinding(packager)))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Typed caller facade
// ---------------------------------------------------------------------------

/// Typed call surface over a shared gateway.
///
/// The orchestrator only talks to providers through this facade, so every
/// call carries a correlation id, honors the per-tool timeout, and comes
/// back as either a typed value or a contained [`ToolFailure`].
#[derive(Clone)]
pub struct GatewayClient {
    gateway: Arc<ProtocolGateway>,
}

impl GatewayClient {
    pub fn new(gateway: Arc<ProtocolGateway>) -> Self {
        Self { gateway }
    }

    async fn call_typed<A: Serialize, R: DeserializeOwned>(
        &self,
        tool_name: &str,
        args: &A,
    ) -> Result<R, ToolFailure> {
        let arguments = serde_json::to_value(args)
            .map_err(|e| ToolFailure::invalid_arguments(format!("argument encoding failed: {e}")))?;
        let result = self
            .gateway
            .dispatch(ToolCallRequest::new(tool_name, arguments))
            .await;
        match result {
            ToolCallResult::Success { content } => serde_json::from_value(content).map_err(|e| {
                ToolFailure::provider(format!("tool '{tool_name}' returned malformed content: {e}"))
            }),
            ToolCallResult::Failure { kind, message } => Err(ToolFailure { kind, message }),
        }
    }

    pub async fn generate(
        &self,
        specification: &Specification,
    ) -> Result<Implementation, ToolFailure> {
        self.call_typed(
            tool_names::GENERATE,
            &GenerateArgs {
                specification: specification.clone(),
            },
        )
        .await
    }

    pub async fn refine(
        &self,
        current: &Implementation,
        test_outcome: &TestOutcome,
        analysis_outcome: &AnalysisOutcome,
        target_quality_score: f64,
    ) -> Result<Implementation, ToolFailure> {
        self.call_typed(
            tool_names::REFINE,
            &RefineArgs {
                current_implementation: current.clone(),
                test_outcome: test_outcome.clone(),
                analysis_outcome: analysis_outcome.clone(),
                target_quality_score,
            },
        )
        .await
    }

    pub async fn test(&self, implementation: &Implementation) -> Result<TestOutcome, ToolFailure> {
        self.call_typed(
            tool_names::TEST,
            &TestArgs {
                implementation: implementation.clone(),
            },
        )
        .await
    }

    pub async fn analyze(
        &self,
        implementation: &Implementation,
    ) -> Result<AnalysisOutcome, ToolFailure> {
        self.call_typed(
            tool_names::ANALYZE,
            &AnalyzeArgs {
                implementation: implementation.clone(),
            },
        )
        .await
    }

    pub async fn package(&self, implementation: &Implementation) -> Result<Value, ToolFailure> {
        self.call_typed(
            tool_names::PACKAGE,
            &PackageArgs {
                implementation: implementation.clone(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ToolErrorKind;
    use crate::domain::models::TimeoutConfig;
    use serde_json::json;

    struct StaticGenerator;

    #[async_trait::async_trait]
    impl Generator for StaticGenerator {
        async fn generate(
            &self,
            _specification: &Specification,
        ) -> anyhow::Result<Implementation> {
            Ok(Implementation::new("fastapi").with_file("main.py", "app = FastAPI()"))
        }

        async fn refine(
            &self,
            current: &Implementation,
            _test_outcome: &TestOutcome,
            _analysis_outcome: &AnalysisOutcome,
            _target_quality_score: f64,
        ) -> anyhow::Result<Implementation> {
            Ok(current.clone().with_file("main.py", "app = FastAPI()  # v2"))
        }
    }

    #[tokio::test]
    async fn test_generate_binding_round_trip() {
        let binding = GenerateBinding(Arc::new(StaticGenerator));
        let args = serde_json::to_value(GenerateArgs {
            specification: Specification::default(),
        })
        .unwrap();
        let content = binding.call(args).await.unwrap();
        let implementation: Implementation = serde_json::from_value(content).unwrap();
        assert!(implementation.has_usable_content());
    }

    #[tokio::test]
    async fn test_invalid_arguments_kind() {
        let binding = GenerateBinding(Arc::new(StaticGenerator));
        let failure = binding.call(json!({"bogus": true})).await.unwrap_err();
        assert_eq!(failure.kind, ToolErrorKind::InvalidArguments);
    }

    #[tokio::test]
    async fn test_client_typed_generate() {
        let mut gateway = ProtocolGateway::new(TimeoutConfig::default());
        gateway
            .register(
                tool_names::GENERATE,
                Arc::new(GenerateBinding(Arc::new(StaticGenerator))),
            )
            .unwrap();
        let client = GatewayClient::new(Arc::new(gateway));

        let implementation = client.generate(&Specification::default()).await.unwrap();
        assert!(implementation.has_usable_content());
    }
}
