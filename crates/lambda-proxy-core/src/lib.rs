//! Core types and configuration for lambda-proxy packaging.
//!
//! This crate defines the `lambda-proxy.toml` schema ([`ProxyConfig`]),
//! discovery of the function's Cargo package ([`FunctionProject`]), and
//! shared error types.

pub mod cargo;
pub mod config;
pub mod error;

pub use cargo::FunctionProject;
pub use config::{CONFIG_FILE, ContainerConfig, ImageConfig, PackageConfig, ProxyConfig};
pub use error::{Error, Result};
