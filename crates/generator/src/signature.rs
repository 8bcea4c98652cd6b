//! Method signature resolution
//!
//! Turns the methods of a service into the Go parameter/result lists used
//! both for the proxy's function fields and for the adapter methods, and
//! fixes the order they are emitted in.

use crate::imports::{TypeScope, EMPTY_MESSAGE, EMPTY_MESSAGE_REF};
use grpcproxy_common::{
    GeneratorError, GoIdent, MessageRef, MethodDefinition, Result, ServiceDefinition,
};
use serde::Serialize;
use std::collections::HashMap;

/// Rendered Go signature of one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    /// Go method name, also the proxy field name
    pub name: String,

    /// Parameter and result lists, e.g.
    /// `(ctx context.Context, req *HelloRequest) (*HelloReply, error)`
    pub signature: String,

    /// Arguments forwarded to the proxy field
    pub call_args: String,

    /// Values returned when the proxy field is unset
    pub not_supported: String,
}

/// Render a message type as it is spelled in the generated file
///
/// `google.protobuf.Empty` always renders as `emptypb.Empty`, so a local
/// message that happens to be named `Empty` cannot shadow it.
pub fn resolve_type_name(message: &MessageRef, scope: &TypeScope) -> String {
    if message.full_name == EMPTY_MESSAGE {
        return EMPTY_MESSAGE_REF.to_string();
    }
    scope.qualify(&message.go_ident)
}

/// Messages spelled out in a method's signature
///
/// A streamed side is only reachable through the generated stream type, so
/// its message never appears in the proxy file.
pub fn rendered_messages(method: &MethodDefinition) -> Vec<&MessageRef> {
    match (method.client_streaming, method.server_streaming) {
        (false, false) => vec![&method.input, &method.output],
        (false, true) => vec![&method.input],
        (true, _) => vec![],
    }
}

/// Render the signature of a single method
///
/// `service_ident` is the service's Go name in the package that holds the
/// gRPC bindings; stream types are named after it.
pub fn method_signature(
    service_ident: &GoIdent,
    method: &MethodDefinition,
    scope: &TypeScope,
) -> MethodSignature {
    let stream_type = || {
        scope.qualify(&GoIdent {
            name: format!("{}_{}Server", service_ident.name, method.name),
            import_path: service_ident.import_path.clone(),
        })
    };

    let (signature, call_args, not_supported) =
        match (method.client_streaming, method.server_streaming) {
            (false, false) => (
                format!(
                    "(ctx context.Context, req *{}) (*{}, error)",
                    resolve_type_name(&method.input, scope),
                    resolve_type_name(&method.output, scope)
                ),
                "ctx, req",
                "nil, errNotSupported",
            ),
            (false, true) => (
                format!(
                    "(req *{}, stream {}) error",
                    resolve_type_name(&method.input, scope),
                    stream_type()
                ),
                "req, stream",
                "errNotSupported",
            ),
            (true, _) => (
                format!("(stream {}) error", stream_type()),
                "stream",
                "errNotSupported",
            ),
        };

    MethodSignature {
        name: method.name.clone(),
        signature,
        call_args: call_args.to_string(),
        not_supported: not_supported.to_string(),
    }
}

/// Render every method of a service, ordered by method name
///
/// Descriptor order is not stable across protoc versions, and the output
/// has to be byte-for-byte reproducible, so the names are sorted bytewise.
pub fn sorted_signatures(
    service: &ServiceDefinition,
    service_ident: &GoIdent,
    scope: &TypeScope,
) -> Result<Vec<MethodSignature>> {
    let mut methods: HashMap<String, MethodSignature> = HashMap::new();
    for method in &service.methods {
        let signature = method_signature(service_ident, method, scope);
        if methods.insert(method.name.clone(), signature).is_some() {
            return Err(GeneratorError::Generation(format!(
                "service {} declares method {} more than once",
                service.name, method.name
            )));
        }
    }

    let mut names: Vec<String> = methods.keys().cloned().collect();
    names.sort_unstable();

    Ok(names
        .into_iter()
        .filter_map(|name| methods.remove(&name))
        .collect())
}
