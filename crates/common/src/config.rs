//! Plugin configuration parsed from the protoc parameter string

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where generated files are placed, protoc-gen-go's `paths=` option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Under the Go import path of the `.proto` file
    #[default]
    Import,

    /// Next to the `.proto` file, relative to the protoc include root
    SourceRelative,
}

/// Configuration of a protoc-gen-grpcproxy run
///
/// protoc forwards everything after `--grpcproxy_opt=` (or before the `:`
/// in `--grpcproxy_out=`) as a single comma-separated parameter string.
/// Besides its own options the plugin understands the options every Go
/// protoc plugin accepts (`paths`, `module`, `M<file>`, `annotate_code`),
/// so it can share an output directory with protoc-gen-go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Generate the proxy into its own Go package instead of alongside the
    /// `.pb.go` files
    pub standalone: bool,

    /// Directory replacing the directory part of every generated file name
    pub out_gopath: Option<String>,

    /// Output layout
    pub paths: PathMode,

    /// Import path prefix stripped from output names in `paths=import` mode
    pub module: Option<String>,

    /// `M<file>=<import path>` overrides of the `go_package` option
    pub import_paths: BTreeMap<String, String>,
}

impl Config {
    /// Parse a parameter string such as `standalone=true,out_gopath=gen/go`
    ///
    /// # Example
    /// ```
    /// use grpcproxy_common::{Config, PathMode};
    ///
    /// let config = Config::from_parameter("standalone,paths=source_relative").unwrap();
    /// assert!(config.standalone);
    /// assert_eq!(config.paths, PathMode::SourceRelative);
    /// ```
    pub fn from_parameter(parameter: &str) -> Result<Self> {
        let mut config = Config::default();

        for param in parameter.split(',') {
            let (key, value) = match param.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (param, None),
            };

            match key {
                "" => {}
                "standalone" => {
                    config.standalone = parse_bool_flag(key, value)?;
                }
                "out_gopath" => {
                    config.out_gopath = value
                        .map(|v| v.trim_end_matches('/'))
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                }
                "paths" => {
                    config.paths = match value.unwrap_or_default() {
                        "import" => PathMode::Import,
                        "source_relative" => PathMode::SourceRelative,
                        other => {
                            return Err(GeneratorError::InvalidParameter(format!(
                                "unknown path type {:?}: want \"import\" or \"source_relative\"",
                                other
                            )));
                        }
                    };
                }
                "module" => {
                    config.module = value
                        .map(|v| v.trim_end_matches('/'))
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                }
                // No annotations are emitted; validated so typos still fail
                "annotate_code" => {
                    parse_bool_flag(key, value)?;
                }
                mapping if mapping.len() > 1 && mapping.starts_with('M') => {
                    config
                        .import_paths
                        .insert(mapping[1..].to_string(), value.unwrap_or_default().to_string());
                }
                unknown => {
                    return Err(GeneratorError::InvalidParameter(format!(
                        "unknown parameter {:?}",
                        unknown
                    )));
                }
            }
        }

        if config.module.is_some() && config.paths == PathMode::SourceRelative {
            return Err(GeneratorError::InvalidParameter(
                "cannot use module= with paths=source_relative".to_string(),
            ));
        }

        Ok(config)
    }
}

/// A flag given bare (`standalone`) or with a boolean value
fn parse_bool_flag(key: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None => Ok(true),
        Some(v) => parse_go_bool(v).ok_or_else(|| {
            GeneratorError::InvalidParameter(format!(
                "invalid boolean value {:?} for {}",
                v, key
            ))
        }),
    }
}

/// Boolean spellings accepted by Go's `strconv.ParseBool`
fn parse_go_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
