//! Go package resolution for `.proto` files

use grpcproxy_common::naming::{base_name, go_sanitized};
use prost_reflect::FileDescriptor;
use std::collections::BTreeMap;

/// Go package a `.proto` file is generated into by protoc-gen-go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoPackage {
    pub name: String,
    pub import_path: String,
}

impl GoPackage {
    /// Resolve the Go package of a linked file descriptor
    ///
    /// An `M<file>=<import path>` mapping for the file takes precedence over
    /// its `go_package` option.
    pub fn of_file(file: &FileDescriptor, import_paths: &BTreeMap<String, String>) -> Self {
        let go_package = import_paths.get(file.name()).map(String::as_str).or_else(|| {
            file.file_descriptor_proto()
                .options
                .as_ref()
                .map(|options| options.go_package())
        });

        Self::resolve(file.name(), file.package_name(), go_package)
    }

    /// Resolve from the raw pieces of a file descriptor
    ///
    /// - `go_package = "example.com/foo;bar"` names the package explicitly
    /// - `go_package = "example.com/foo"` takes the last path element
    /// - without the option the import path is the file's directory (or its
    ///   stem for top-level files) and the name comes from the proto package
    pub fn resolve(file_name: &str, proto_package: &str, go_package: Option<&str>) -> Self {
        let file_stem = base_name(file_name).trim_end_matches(".proto");

        match go_package.filter(|p| !p.is_empty()) {
            Some(option) => {
                let (import_path, name) = match option.split_once(';') {
                    Some((path, name)) => (path, name.to_string()),
                    None => (option, base_name(option).to_string()),
                };
                Self {
                    name: go_sanitized(&name),
                    import_path: import_path.to_string(),
                }
            }
            None => {
                let import_path = match file_name.rsplit_once('/') {
                    Some((dir, _)) => dir.to_string(),
                    None => file_stem.to_string(),
                };
                let name = if proto_package.is_empty() {
                    file_stem.to_string()
                } else {
                    proto_package.replace('.', "_")
                };
                Self {
                    name: go_sanitized(&name),
                    import_path,
                }
            }
        }
    }
}
