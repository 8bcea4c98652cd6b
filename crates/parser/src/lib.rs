//! Plugin request parsing for protoc-gen-grpcproxy
//!
//! This crate turns the `CodeGeneratorRequest` protoc hands to a plugin into
//! the intermediate representation (`FileDefinition`) the generator works
//! on.
//!
//! ## Parsing Strategy
//!
//! The request's `FileDescriptorProto`s are linked into a
//! `prost_reflect::DescriptorPool` so that method input/output type names
//! resolve to the message descriptors and the files declaring them. From
//! there every file is converted with the Go names protoc-gen-go would
//! assign:
//! - services and methods: `GoCamelCase` of the proto name
//! - messages: `GoCamelCase` of the name relative to the proto package
//! - packages: the `go_package` option, falling back to the proto package

pub mod protobuf;

pub use protobuf::{decode_request, GoPackage, RequestParser};

use grpcproxy_common::{Config, FileDefinition, Result};

/// Decode a request and convert it into configuration plus file definitions
///
/// # Arguments
/// * `bytes` - Serialized `CodeGeneratorRequest` as read from stdin
///
/// # Returns
/// * `(Config, Vec<FileDefinition>)` - Parsed plugin parameter and files
pub fn parse_request(bytes: &[u8]) -> Result<(Config, Vec<FileDefinition>)> {
    let parser = RequestParser::from_bytes(bytes)?;
    let config = parser.config()?;
    let files = parser.parse(&config)?;
    Ok((config, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use prost_types::compiler::CodeGeneratorRequest;

    #[test]
    fn test_parse_request_reports_bad_parameter() {
        let request = CodeGeneratorRequest {
            parameter: Some("bogus=1".to_string()),
            ..Default::default()
        };

        let result = parse_request(&request.encode_to_vec());
        assert!(result.is_err());
    }
}
