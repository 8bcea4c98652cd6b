//! Template loading and management

use grpcproxy_common::naming::lower_camel;
use grpcproxy_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Name the proxy template is registered under
pub const PROXY_TEMPLATE: &str = "proxy.go";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("lower_camel", lower_camel_filter);

    tera.add_raw_template(PROXY_TEMPLATE, include_str!("../templates/proxy.go.tera"))
        .map_err(|e| {
            GeneratorError::Generation(format!("Failed to load proxy.go template: {}", e))
        })?;

    Ok(tera)
}

/// Filter to turn a Go name into lowerCamelCase
fn lower_camel_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("lower_camel filter expects a string"))?;

    Ok(Value::String(lower_camel(s)))
}
