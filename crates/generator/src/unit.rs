//! Generated output units and their file names

use grpcproxy_common::{Config, FileDefinition, GeneratorError, PathMode, Result};
use serde::Serialize;

/// Suffix appended to the proto file stem to name the generated file
pub const FILE_NAME_SUFFIX: &str = "_proxy.pb.go";

/// Generated source for one `.proto` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUnit {
    /// Path relative to the plugin output directory, `/`-separated
    pub name: String,

    pub content: String,
}

/// Go package name of the proxy in standalone mode
pub fn proxy_package_name(file: &FileDefinition) -> String {
    format!("{}proxy", file.go_package_name)
}

/// Output path of the proxy generated for `file`
///
/// Follows protoc-gen-go's layout so the proxy lands next to the `.pb.go`
/// file: with `paths=import` (the default) the directory is the Go import
/// path, minus the `module` prefix when one is set; with
/// `paths=source_relative` it is the `.proto` file's directory.
/// `out_gopath` replaces the directory part; standalone mode adds the
/// proxy package directory.
pub fn output_file_name(file: &FileDefinition, config: &Config) -> Result<String> {
    let stem = file.name.strip_suffix(".proto").unwrap_or(&file.name);
    let (source_dir, base) = match stem.rsplit_once('/') {
        Some((dir, base)) => (Some(dir), base),
        None => (None, stem),
    };

    let dir = match (config.out_gopath.as_deref(), config.paths) {
        (Some(out_gopath), _) => Some(out_gopath),
        (None, PathMode::SourceRelative) => source_dir,
        (None, PathMode::Import) => import_dir(file, config.module.as_deref())?,
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(dir) = dir.filter(|d| !d.is_empty()) {
        parts.push(dir.to_string());
    }
    if config.standalone {
        parts.push(proxy_package_name(file));
    }
    parts.push(format!("{}{}", base, FILE_NAME_SUFFIX));

    Ok(parts.join("/"))
}

/// Directory under `paths=import`, relative to `module` when set
fn import_dir<'a>(file: &'a FileDefinition, module: Option<&str>) -> Result<Option<&'a str>> {
    let import_path = file.go_import_path.as_str();
    let Some(module) = module else {
        return Ok(Some(import_path));
    };

    if import_path == module {
        return Ok(None);
    }
    match import_path
        .strip_prefix(module)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(rest) => Ok(Some(rest)),
        None => Err(GeneratorError::Generation(format!(
            "{}: import path {:?} does not match module prefix {:?}",
            file.name, import_path, module
        ))),
    }
}
