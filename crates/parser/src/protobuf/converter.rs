//! Converts linked protobuf descriptors to the generator IR

use super::go_package::GoPackage;
use grpcproxy_common::naming::go_camel_case;
use grpcproxy_common::{
    Config, FileDefinition, GeneratorError, GoIdent, MessageRef, MethodDefinition, Result,
    ServiceDefinition, Syntax,
};
use prost_reflect::{DescriptorPool, FileDescriptor, MessageDescriptor, ServiceDescriptor};
use std::collections::{BTreeMap, HashSet};

/// Convert every file of the pool, in the order protoc sent them
pub fn convert_files(
    pool: &DescriptorPool,
    files_to_generate: &HashSet<String>,
    config: &Config,
) -> Result<Vec<FileDefinition>> {
    pool.files()
        .map(|file| {
            let generate = files_to_generate.contains(file.name());
            convert_file(&file, generate, &config.import_paths)
        })
        .collect()
}

/// Convert one file descriptor
fn convert_file(
    file: &FileDescriptor,
    generate: bool,
    import_paths: &BTreeMap<String, String>,
) -> Result<FileDefinition> {
    let raw_syntax = file.file_descriptor_proto().syntax();
    let syntax = Syntax::from_descriptor(raw_syntax).ok_or_else(|| {
        GeneratorError::Parse(format!(
            "{}: unsupported syntax {:?}",
            file.name(),
            raw_syntax
        ))
    })?;

    let go_package = GoPackage::of_file(file, import_paths);
    let services = file
        .services()
        .map(|s| convert_service(&s, import_paths))
        .collect();

    Ok(FileDefinition {
        name: file.name().to_string(),
        syntax,
        go_package_name: go_package.name,
        go_import_path: go_package.import_path,
        generate,
        services,
    })
}

/// Convert a service and its methods, keeping declaration order
fn convert_service(
    service: &ServiceDescriptor,
    import_paths: &BTreeMap<String, String>,
) -> ServiceDefinition {
    let methods = service
        .methods()
        .map(|method| MethodDefinition {
            name: go_camel_case(method.name()),
            input: message_ref(&method.input(), import_paths),
            output: message_ref(&method.output(), import_paths),
            client_streaming: method.is_client_streaming(),
            server_streaming: method.is_server_streaming(),
        })
        .collect();

    ServiceDefinition {
        name: go_camel_case(service.name()),
        methods,
    }
}

/// Build the reference to a request/response message
///
/// protoc-gen-go names nested messages after their path inside the package,
/// so `pkg.Outer.Inner` becomes `Outer_Inner`.
fn message_ref(message: &MessageDescriptor, import_paths: &BTreeMap<String, String>) -> MessageRef {
    let full_name = message.full_name();
    let package = message.package_name();
    let relative_name = if package.is_empty() {
        full_name
    } else {
        full_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(full_name)
    };

    let go_package = GoPackage::of_file(&message.parent_file(), import_paths);

    MessageRef {
        full_name: full_name.to_string(),
        go_ident: GoIdent {
            name: go_camel_case(relative_name),
            import_path: go_package.import_path,
        },
        go_package_name: go_package.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{
        DescriptorProto, FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto,
        ServiceDescriptorProto,
    };

    fn pool_with_nested_message() -> DescriptorPool {
        let file = FileDescriptorProto {
            name: Some("nested.proto".to_string()),
            package: Some("acme.v1".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Outer".to_string()),
                nested_type: vec![DescriptorProto {
                    name: Some("Inner".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            service: vec![ServiceDescriptorProto {
                name: Some("nested_service".to_string()),
                method: vec![MethodDescriptorProto {
                    name: Some("do_thing".to_string()),
                    input_type: Some(".acme.v1.Outer.Inner".to_string()),
                    output_type: Some(".acme.v1.Outer".to_string()),
                    server_streaming: Some(true),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };

        DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] }).unwrap()
    }

    #[test]
    fn test_nested_message_go_name() {
        let pool = pool_with_nested_message();
        let files = convert_files(&pool, &HashSet::new(), &Config::default()).unwrap();

        let method = &files[0].services[0].methods[0];
        assert_eq!(method.input.full_name, "acme.v1.Outer.Inner");
        assert_eq!(method.input.go_ident.name, "Outer_Inner");
        assert_eq!(method.output.go_ident.name, "Outer");
    }

    #[test]
    fn test_names_are_camel_cased() {
        let pool = pool_with_nested_message();
        let files = convert_files(&pool, &HashSet::new(), &Config::default()).unwrap();

        let service = &files[0].services[0];
        assert_eq!(service.name, "NestedService");
        assert_eq!(service.methods[0].name, "DoThing");
        assert!(service.methods[0].server_streaming);
        assert!(!service.methods[0].client_streaming);
    }

    #[test]
    fn test_generate_flag_follows_request() {
        let pool = pool_with_nested_message();

        let files = convert_files(&pool, &HashSet::new(), &Config::default()).unwrap();
        assert!(!files[0].generate);

        let requested = HashSet::from(["nested.proto".to_string()]);
        let files = convert_files(&pool, &requested, &Config::default()).unwrap();
        assert!(files[0].generate);
        assert_eq!(files[0].syntax, Syntax::Proto3);
        assert_eq!(files[0].go_package_name, "acme_v1");
    }

    #[test]
    fn test_import_path_mapping_overrides_package() {
        let pool = pool_with_nested_message();
        let config = Config::from_parameter("Mnested.proto=example.com/acme/v1;acmepb").unwrap();
        let files = convert_files(&pool, &HashSet::new(), &config).unwrap();

        assert_eq!(files[0].go_import_path, "example.com/acme/v1");
        assert_eq!(files[0].go_package_name, "acmepb");

        let input = &files[0].services[0].methods[0].input;
        assert_eq!(input.go_ident.import_path, "example.com/acme/v1");
        assert_eq!(input.go_package_name, "acmepb");
    }
}
