//! CodeGeneratorRequest parser

use grpcproxy_common::{Config, FileDefinition, GeneratorError, Result};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::FileDescriptorSet;
use std::collections::HashSet;

/// Decode the raw bytes protoc sends on stdin
///
/// A failure here means protoc itself misbehaved (or the binary was not run
/// as a plugin), so callers treat it as fatal rather than reporting it in
/// the response.
pub fn decode_request(bytes: &[u8]) -> Result<CodeGeneratorRequest> {
    CodeGeneratorRequest::decode(bytes).map_err(|e| {
        GeneratorError::Parse(format!(
            "Failed to decode CodeGeneratorRequest (is this running as a protoc plugin?): {}",
            e
        ))
    })
}

/// Parser for a protoc plugin request
///
/// Holds the linked descriptor pool, the set of files protoc asked to
/// generate and the raw parameter string.
pub struct RequestParser {
    /// Descriptor pool for reflection
    pool: DescriptorPool,

    /// Files explicitly listed on the protoc command line
    files_to_generate: HashSet<String>,

    /// Comma-separated plugin parameter
    parameter: String,
}

impl RequestParser {
    /// Decode and link a request from its wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_request(decode_request(bytes)?)
    }

    /// Link the descriptors of an already decoded request
    ///
    /// # Example
    /// ```rust,ignore
    /// let request = decode_request(&bytes)?;
    /// let parser = RequestParser::from_request(request)?;
    /// ```
    pub fn from_request(request: CodeGeneratorRequest) -> Result<Self> {
        let parameter = request.parameter().to_string();
        let files_to_generate: HashSet<String> = request.file_to_generate.into_iter().collect();

        let file_descriptor_set = FileDescriptorSet {
            file: request.proto_file,
        };
        let pool = DescriptorPool::from_file_descriptor_set(file_descriptor_set).map_err(|e| {
            GeneratorError::Parse(format!("Failed to create DescriptorPool: {}", e))
        })?;

        tracing::debug!(
            files = pool.files().count(),
            to_generate = files_to_generate.len(),
            "linked descriptor pool"
        );

        Ok(Self {
            pool,
            files_to_generate,
            parameter,
        })
    }

    /// Raw plugin parameter string
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Plugin configuration parsed from the parameter string
    pub fn config(&self) -> Result<Config> {
        Config::from_parameter(&self.parameter)
    }

    /// Convert every file of the request into the generator IR
    ///
    /// Files keep the order protoc sent them in; dependencies that were not
    /// requested are included with `generate` unset. `config` supplies the
    /// `M<file>` import path mappings.
    pub fn parse(&self, config: &Config) -> Result<Vec<FileDefinition>> {
        super::converter::convert_files(&self.pool, &self.files_to_generate, config)
    }
}
