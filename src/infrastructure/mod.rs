//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - Protocol gateway and tool bindings
//! - Tool provider implementations (HTTP generator, offline tester/analyzer/packager)
//! - Configuration management
//! - Logging infrastructure
//! - Specification file loading
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod providers;
pub mod spec_loader;
