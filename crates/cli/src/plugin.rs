//! protoc plugin protocol: request in, response out

use grpcproxy_common::{GeneratorError, Result};
use grpcproxy_generator::{GeneratedUnit, OutputSink, ProxyGenerator};
use grpcproxy_parser::RequestParser;
use prost_types::compiler::code_generator_response::File;
use prost_types::compiler::CodeGeneratorRequest;
use std::fs;
use std::path::Path;

/// `CodeGeneratorResponse.Feature` bits
pub const FEATURE_PROTO3_OPTIONAL: u64 = 1;
pub const FEATURE_SUPPORTS_EDITIONS: u64 = 2;

/// `google.protobuf.Edition` values bounding the supported editions
pub const EDITION_PROTO2: i32 = 998;
pub const EDITION_2023: i32 = 1000;

/// `google.protobuf.compiler.CodeGeneratorResponse`
///
/// Declared here so the edition range fields are available regardless of
/// the descriptor revision bundled with prost-types. The wire format is the
/// one protoc expects.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PluginResponse {
    #[prost(string, optional, tag = "1")]
    pub error: Option<String>,
    #[prost(uint64, optional, tag = "2")]
    pub supported_features: Option<u64>,
    #[prost(int32, optional, tag = "3")]
    pub minimum_edition: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub maximum_edition: Option<i32>,
    #[prost(message, repeated, tag = "15")]
    pub file: Vec<File>,
}

impl PluginResponse {
    /// Empty response carrying the capabilities this plugin declares
    pub fn with_capabilities() -> Self {
        Self {
            supported_features: Some(FEATURE_PROTO3_OPTIONAL | FEATURE_SUPPORTS_EDITIONS),
            minimum_edition: Some(EDITION_PROTO2),
            maximum_edition: Some(EDITION_2023),
            ..Default::default()
        }
    }
}

/// Output sink collecting units as response files
#[derive(Debug, Default)]
struct ResponseFiles {
    files: Vec<File>,
}

impl OutputSink for ResponseFiles {
    fn register(&mut self, unit: GeneratedUnit) {
        self.files.push(File {
            name: Some(unit.name),
            content: Some(unit.content),
            ..Default::default()
        });
    }
}

/// Run the generator over a decoded request
///
/// Problems with the request contents end up in the response's `error`
/// field; protoc prints it and fails the build.
pub fn generate_response(request: CodeGeneratorRequest) -> PluginResponse {
    match generate_files(request) {
        Ok(file) => PluginResponse {
            file,
            ..PluginResponse::with_capabilities()
        },
        Err(e) => {
            tracing::warn!(error = %e, "generation failed");
            PluginResponse {
                error: Some(e.to_string()),
                ..PluginResponse::with_capabilities()
            }
        }
    }
}

fn generate_files(request: CodeGeneratorRequest) -> Result<Vec<File>> {
    let parser = RequestParser::from_request(request)?;
    let config = parser.config()?;
    let files = parser.parse(&config)?;

    let generator = ProxyGenerator::new(config)?;
    let mut sink = ResponseFiles::default();
    generator.generate_files(&files, &mut sink)?;

    Ok(sink.files)
}

/// Write the files of a response below `output_dir`
///
/// Used when running outside protoc; mirrors what protoc does with the
/// response. Names must stay below `output_dir`.
pub fn write_to_directory(response: &PluginResponse, output_dir: &Path) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(response.file.len());

    for file in &response.file {
        let name = file.name();
        if name.is_empty()
            || name.starts_with('/')
            || Path::new(name).is_absolute()
            || name.split('/').any(|part| part == "..")
        {
            return Err(GeneratorError::Generation(format!(
                "refusing to write invalid output path {:?}",
                name
            )));
        }

        let path = output_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, file.content())?;
        written.push(name.to_string());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use prost_types::compiler::CodeGeneratorResponse;
    use prost_types::{
        DescriptorProto, FileDescriptorProto, FileOptions, MethodDescriptorProto,
        ServiceDescriptorProto,
    };
    use tempfile::TempDir;

    fn greeter_request(parameter: Option<&str>) -> CodeGeneratorRequest {
        let message = |name: &str| DescriptorProto {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let greeter = FileDescriptorProto {
            name: Some("helloworld/helloworld.proto".to_string()),
            package: Some("helloworld".to_string()),
            message_type: vec![message("HelloRequest"), message("HelloReply")],
            service: vec![ServiceDescriptorProto {
                name: Some("Greeter".to_string()),
                method: vec![MethodDescriptorProto {
                    name: Some("SayHello".to_string()),
                    input_type: Some(".helloworld.HelloRequest".to_string()),
                    output_type: Some(".helloworld.HelloReply".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            options: Some(FileOptions {
                go_package: Some("example.com/helloworld".to_string()),
                ..Default::default()
            }),
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };

        let messages = FileDescriptorProto {
            name: Some("helloworld/types.proto".to_string()),
            package: Some("helloworld.types".to_string()),
            message_type: vec![message("Unused")],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };

        CodeGeneratorRequest {
            file_to_generate: vec![
                "helloworld/helloworld.proto".to_string(),
                "helloworld/types.proto".to_string(),
            ],
            parameter: parameter.map(str::to_string),
            proto_file: vec![greeter, messages],
            ..Default::default()
        }
    }

    #[test]
    fn test_response_declares_capabilities() {
        let response = generate_response(greeter_request(None));

        assert_eq!(response.error, None);
        assert_eq!(response.supported_features, Some(3));
        assert_eq!(response.minimum_edition, Some(EDITION_PROTO2));
        assert_eq!(response.maximum_edition, Some(EDITION_2023));
    }

    #[test]
    fn test_only_files_with_services_are_returned() {
        let response = generate_response(greeter_request(None));

        assert_eq!(response.file.len(), 1);
        assert_eq!(
            response.file[0].name(),
            "example.com/helloworld/helloworld_proxy.pb.go"
        );
        assert!(response.file[0]
            .content()
            .starts_with("// Code generated by protoc-gen-grpcproxy. DO NOT EDIT.\n\npackage helloworld\n"));
    }

    #[test]
    fn test_bad_parameter_is_reported_in_response() {
        let response = generate_response(greeter_request(Some("nonsense=1")));

        assert!(response.file.is_empty());
        let error = response.error.unwrap();
        assert!(error.contains("nonsense"));
        assert_eq!(response.supported_features, Some(3));
    }

    #[test]
    fn test_response_decodes_as_code_generator_response() {
        let bytes = generate_response(greeter_request(None)).encode_to_vec();
        let decoded = CodeGeneratorResponse::decode(bytes.as_slice()).unwrap();

        assert_eq!(decoded.supported_features, Some(3));
        assert_eq!(decoded.file.len(), 1);
        assert_eq!(
            decoded.file[0].name(),
            "example.com/helloworld/helloworld_proxy.pb.go"
        );
    }

    #[test]
    fn test_write_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let response = generate_response(greeter_request(Some("out_gopath=gen/go")));

        let written = write_to_directory(&response, temp_dir.path()).unwrap();
        assert_eq!(written, vec!["gen/go/helloworld_proxy.pb.go".to_string()]);

        let content =
            fs::read_to_string(temp_dir.path().join("gen/go/helloworld_proxy.pb.go")).unwrap();
        assert!(content.contains("type Proxy struct {"));
    }

    #[test]
    fn test_write_rejects_parent_components() {
        let temp_dir = TempDir::new().unwrap();
        let response = PluginResponse {
            file: vec![File {
                name: Some("../escape.go".to_string()),
                content: Some(String::new()),
                ..Default::default()
            }],
            ..Default::default()
        };

        assert!(write_to_directory(&response, temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_rejects_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        let response = generate_response(greeter_request(Some("out_gopath=/tmp/elsewhere")));
        assert_eq!(response.error, None);
        assert_eq!(response.file[0].name(), "/tmp/elsewhere/helloworld_proxy.pb.go");

        let result = write_to_directory(&response, temp_dir.path());
        assert!(matches!(result, Err(GeneratorError::Generation(_))));
    }

    #[test]
    fn test_go_plugin_options_place_output_like_protoc_gen_go() {
        let response = generate_response(greeter_request(Some("paths=source_relative")));
        assert_eq!(response.error, None);
        assert_eq!(response.file[0].name(), "helloworld/helloworld_proxy.pb.go");

        let response = generate_response(greeter_request(Some("module=example.com")));
        assert_eq!(response.file[0].name(), "helloworld/helloworld_proxy.pb.go");
    }
}
