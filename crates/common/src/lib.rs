//! Common types and utilities for protoc-gen-grpcproxy
//!
//! This crate contains the intermediate representation shared by the parser
//! and the generator, the plugin configuration, the error type and the Go
//! naming helpers.

mod config;
pub mod naming;

pub use config::{Config, PathMode};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during proxy generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid plugin parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Schema syntax of a `.proto` file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Syntax {
    Proto2,
    Proto3,
    Editions,
}

impl Syntax {
    /// Map the `syntax` field of a `FileDescriptorProto`.
    ///
    /// protoc leaves the field empty for proto2 files.
    pub fn from_descriptor(syntax: &str) -> Option<Self> {
        match syntax {
            "" | "proto2" => Some(Syntax::Proto2),
            "proto3" => Some(Syntax::Proto3),
            "editions" => Some(Syntax::Editions),
            _ => None,
        }
    }
}

/// A Go identifier together with the import path of the package declaring it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoIdent {
    pub name: String,
    pub import_path: String,
}

/// Reference from a method to its request or response message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Fully-qualified protobuf name without the leading dot
    /// (e.g. `google.protobuf.Empty`)
    pub full_name: String,

    /// Go identifier generated by protoc-gen-go for the message
    pub go_ident: GoIdent,

    /// Go package name of the file declaring the message
    pub go_package_name: String,
}

/// One RPC method of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    /// Go name of the method (e.g. `SayHello`)
    pub name: String,
    pub input: MessageRef,
    pub output: MessageRef,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

impl MethodDefinition {
    pub fn is_unary(&self) -> bool {
        !self.client_streaming && !self.server_streaming
    }
}

/// One RPC service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Go name of the service (e.g. `Greeter`)
    pub name: String,

    /// Methods in declaration order
    pub methods: Vec<MethodDefinition>,
}

/// One `.proto` file handed to the plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDefinition {
    /// Logical name as given to protoc (e.g. `helloworld/helloworld.proto`)
    pub name: String,
    pub syntax: Syntax,
    pub go_package_name: String,
    pub go_import_path: String,

    /// Whether protoc asked for this file to be generated
    pub generate: bool,

    pub services: Vec<ServiceDefinition>,
}
