//! Container Packager provider.
//!
//! Produces a container build specification for a converged implementation:
//! a generated Dockerfile plus metadata the deployment tooling consumes.
//! Nothing is built here; the output is a description.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::models::Implementation;
use crate::domain::ports::Packager;

/// Packager emitting a Dockerfile-based build spec.
#[derive(Debug, Default)]
pub struct ContainerPackager;

impl ContainerPackager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Packager for ContainerPackager {
    async fn package(&self, implementation: &Implementation) -> Result<Value> {
        if !implementation.has_usable_content() {
            bail!("cannot package an implementation with no source files");
        }

        let (base_image, entrypoint) = runtime_for(&implementation.framework);
        let dockerfile = render_dockerfile(implementation, base_image, entrypoint);

        debug!(
            framework = %implementation.framework,
            files = implementation.source_files.len(),
            "build spec assembled"
        );

        Ok(json!({
            "kind": "container_build_spec",
            "base_image": base_image,
            "dockerfile": dockerfile,
            "files": implementation.source_files.keys().collect::<Vec<_>>(),
            "dependencies": implementation.dependencies,
            "expose": 8000,
        }))
    }
}

fn runtime_for(framework: &str) -> (&'static str, &'static str) {
    match framework {
        "axum" => ("rust:1.83-slim", "./target/release/app"),
        "flask" => (
            "python:3.12-slim",
            "gunicorn --bind 0.0.0.0:8000 main:app",
        ),
        // FastAPI and anything unrecognized get the uvicorn default.
        _ => ("python:3.12-slim", "uvicorn main:app --host 0.0.0.0 --port 8000"),
    }
}

fn render_dockerfile(
    implementation: &Implementation,
    base_image: &str,
    entrypoint: &str,
) -> String {
    let mut dockerfile = format!("FROM {base_image}\nWORKDIR /app\n");
    if !implementation.dependencies.is_empty() {
        let packages: Vec<&str> = implementation
            .dependencies
            .iter()
            .map(String::as_str)
            .collect();
        dockerfile.push_str(&format!(
            "RUN pip install --no-cache-dir {}\n",
            packages.join(" ")
        ));
    }
    dockerfile.push_str("COPY . /app\nEXPOSE 8000\n");
    dockerfile.push_str(&format!("CMD {entrypoint}\n"));
    dockerfile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_spec_shape() {
        let implementation = Implementation::new("fastapi")
            .with_file("main.py", "app = FastAPI()")
            .with_dependency("fastapi")
            .with_dependency("uvicorn");

        let spec = ContainerPackager::new().package(&implementation).await.unwrap();
        assert_eq!(spec["kind"], "container_build_spec");
        assert_eq!(spec["base_image"], "python:3.12-slim");
        let dockerfile = spec["dockerfile"].as_str().unwrap();
        assert!(dockerfile.contains("pip install --no-cache-dir fastapi uvicorn"));
        assert!(dockerfile.contains("uvicorn main:app"));
    }

    #[tokio::test]
    async fn test_empty_implementation_rejected() {
        let err = ContainerPackager::new()
            .package(&Implementation::new("fastapi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no source files"));
    }
}
