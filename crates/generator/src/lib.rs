//! Go proxy generation for protoc-gen-grpcproxy
//!
//! For every `.proto` file that declares at least one service this crate
//! renders a `_proxy.pb.go` file containing, per service:
//! - a `Proxy` struct with one function field per RPC method
//! - a `Serve` method that registers the proxy on a `grpc.Server`
//! - an adapter implementing the gRPC server interface, which forwards each
//!   call to the matching field or returns `errNotSupported` when it is nil

mod imports;
mod signature;
mod templates;
mod unit;

pub use imports::{
    Import, ImportSet, TypeScope, CONTEXT_PACKAGE, EMPTY_MESSAGE, EMPTY_MESSAGE_REF,
    EMPTY_PACKAGE, ERRORS_PACKAGE, GRPC_PACKAGE, NET_PACKAGE,
};
pub use signature::{
    method_signature, rendered_messages, resolve_type_name, sorted_signatures, MethodSignature,
};
pub use unit::{output_file_name, proxy_package_name, GeneratedUnit, FILE_NAME_SUFFIX};

use grpcproxy_common::{Config, FileDefinition, GeneratorError, GoIdent, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tera::Tera;

/// Receiver of the units produced by a generation run
///
/// The plugin runner owns the final output set; the generator only hands
/// finished units over.
#[cfg_attr(test, mockall::automock)]
pub trait OutputSink {
    fn register(&mut self, unit: GeneratedUnit);
}

impl OutputSink for Vec<GeneratedUnit> {
    fn register(&mut self, unit: GeneratedUnit) {
        self.push(unit);
    }
}

/// Template context for one service
#[derive(Debug, Serialize)]
struct ServiceContext {
    name: String,
    proxy_name: String,
    register_func: String,
    unimplemented_server: String,
    methods: Vec<MethodSignature>,
}

/// Proxy generator
///
/// Walks the files of a request and renders one proxy file for each file
/// that declares services.
pub struct ProxyGenerator {
    config: Config,
    tera: Tera,
}

impl ProxyGenerator {
    /// Create a new proxy generator
    pub fn new(config: Config) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { config, tera })
    }

    /// Generate every file marked for generation into `sink`
    ///
    /// Files without services produce nothing. Returns the number of units
    /// registered.
    pub fn generate_files(
        &self,
        files: &[FileDefinition],
        sink: &mut dyn OutputSink,
    ) -> Result<usize> {
        let mut generated = 0;

        for file in files.iter().filter(|f| f.generate) {
            match self.generate_file(file)? {
                Some(unit) => {
                    tracing::debug!(file = %file.name, output = %unit.name, "generated proxy");
                    sink.register(unit);
                    generated += 1;
                }
                None => {
                    tracing::debug!(file = %file.name, "no services, skipping");
                }
            }
        }

        tracing::info!(generated, "proxy generation complete");
        Ok(generated)
    }

    /// Generate every file marked for generation and collect the units
    pub fn generate(&self, files: &[FileDefinition]) -> Result<Vec<GeneratedUnit>> {
        let mut units = Vec::new();
        self.generate_files(files, &mut units)?;
        Ok(units)
    }

    /// Render the proxy file for a single `.proto` file
    ///
    /// Returns `None` for a file without services: an output holding only a
    /// package clause and unused imports would not compile.
    pub fn generate_file(&self, file: &FileDefinition) -> Result<Option<GeneratedUnit>> {
        if file.services.is_empty() {
            return Ok(None);
        }

        tracing::debug!(
            file = %file.name,
            syntax = ?file.syntax,
            services = file.services.len(),
            "rendering proxy"
        );

        let name = output_file_name(file, &self.config)?;
        let scope = self.build_scope(file);
        let content = self.render(file, &scope)?;

        Ok(Some(GeneratedUnit { name, content }))
    }

    /// Collect the imports a file needs and fix their aliases
    ///
    /// Standard packages are registered first so they keep their plain
    /// names; message packages follow in import path order. Only messages
    /// that end up in a signature count, since Go rejects unused imports.
    fn build_scope(&self, file: &FileDefinition) -> TypeScope {
        let local_import_path = if self.config.standalone {
            String::new()
        } else {
            file.go_import_path.clone()
        };

        let methods = || file.services.iter().flat_map(|s| s.methods.iter());
        let messages = || methods().flat_map(rendered_messages);

        let mut imports = ImportSet::new();
        if methods().any(|m| m.is_unary()) {
            imports.add_package(CONTEXT_PACKAGE);
        }
        imports.add_package(ERRORS_PACKAGE);
        imports.add_package(NET_PACKAGE);
        imports.add_package(GRPC_PACKAGE);
        if messages().any(|m| m.full_name == EMPTY_MESSAGE) {
            imports.add_package(EMPTY_PACKAGE);
        }
        if self.config.standalone {
            imports.add(&file.go_import_path, &file.go_package_name);
        }

        let referenced: BTreeMap<&str, &str> = messages()
            .filter(|m| m.full_name != EMPTY_MESSAGE)
            .filter(|m| m.go_ident.import_path != local_import_path)
            .map(|m| (m.go_ident.import_path.as_str(), m.go_package_name.as_str()))
            .collect();
        for (path, name) in referenced {
            imports.add(path, name);
        }

        TypeScope::new(local_import_path, imports)
    }

    fn render(&self, file: &FileDefinition, scope: &TypeScope) -> Result<String> {
        let single_service = file.services.len() == 1;

        let mut services = Vec::with_capacity(file.services.len());
        for service in &file.services {
            let service_ident = GoIdent {
                name: service.name.clone(),
                import_path: file.go_import_path.clone(),
            };
            let qualify = |name: String| {
                scope.qualify(&GoIdent {
                    name,
                    import_path: file.go_import_path.clone(),
                })
            };

            services.push(ServiceContext {
                name: service.name.clone(),
                proxy_name: if single_service {
                    "Proxy".to_string()
                } else {
                    format!("{}Proxy", service.name)
                },
                register_func: qualify(format!("Register{}Server", service.name)),
                unimplemented_server: qualify(format!("Unimplemented{}Server", service.name)),
                methods: sorted_signatures(service, &service_ident, scope)?,
            });
        }

        let package_name = if self.config.standalone {
            proxy_package_name(file)
        } else {
            file.go_package_name.clone()
        };

        let mut context = tera::Context::new();
        context.insert("package_name", &package_name);
        context.insert("imports", &scope.imports().to_imports());
        context.insert("services", &services);

        let rendered = self
            .tera
            .render(templates::PROXY_TEMPLATE, &context)
            .map_err(|e| GeneratorError::Generation(format!("Template error: {:?}", e)))?;

        let mut content = rendered.trim_end().to_string();
        content.push('\n');
        Ok(content)
    }
}

/// Generate proxies for all requested files (convenience function)
pub fn generate_proxies(config: Config, files: &[FileDefinition]) -> Result<Vec<GeneratedUnit>> {
    let generator = ProxyGenerator::new(config)?;
    generator.generate(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grpcproxy_common::{MessageRef, MethodDefinition, ServiceDefinition, Syntax};

    fn message(name: &str) -> MessageRef {
        MessageRef {
            full_name: format!("helloworld.{}", name),
            go_ident: GoIdent {
                name: name.to_string(),
                import_path: "example.com/helloworld".to_string(),
            },
            go_package_name: "helloworld".to_string(),
        }
    }

    fn file(name: &str, services: Vec<ServiceDefinition>) -> FileDefinition {
        FileDefinition {
            name: name.to_string(),
            syntax: Syntax::Proto3,
            go_package_name: "helloworld".to_string(),
            go_import_path: "example.com/helloworld".to_string(),
            generate: true,
            services,
        }
    }

    fn greeter() -> ServiceDefinition {
        ServiceDefinition {
            name: "Greeter".to_string(),
            methods: vec![MethodDefinition {
                name: "SayHello".to_string(),
                input: message("HelloRequest"),
                output: message("HelloReply"),
                client_streaming: false,
                server_streaming: false,
            }],
        }
    }

    #[test]
    fn test_generator_creation() {
        let result = ProxyGenerator::new(Config::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_each_qualifying_file_registers_once() {
        let generator = ProxyGenerator::new(Config::default()).unwrap();
        let files = vec![
            file("a.proto", vec![greeter()]),
            file("b.proto", vec![]),
            file("c.proto", vec![greeter()]),
        ];

        let mut sink = MockOutputSink::new();
        sink.expect_register()
            .withf(|unit| unit.name == "example.com/helloworld/a_proxy.pb.go")
            .times(1)
            .return_const(());
        sink.expect_register()
            .withf(|unit| unit.name == "example.com/helloworld/c_proxy.pb.go")
            .times(1)
            .return_const(());

        let generated = generator.generate_files(&files, &mut sink).unwrap();
        assert_eq!(generated, 2);
    }

    #[test]
    fn test_files_not_marked_for_generation_are_skipped() {
        let generator = ProxyGenerator::new(Config::default()).unwrap();
        let mut dependency = file("dep.proto", vec![greeter()]);
        dependency.generate = false;

        let mut sink = MockOutputSink::new();
        sink.expect_register().never();

        let generated = generator.generate_files(&[dependency], &mut sink).unwrap();
        assert_eq!(generated, 0);
    }

    #[test]
    fn test_file_without_services_yields_nothing() {
        let generator = ProxyGenerator::new(Config::default()).unwrap();
        let unit = generator.generate_file(&file("empty.proto", vec![])).unwrap();
        assert!(unit.is_none());
    }

    #[test]
    fn test_output_ends_with_single_newline() {
        let generator = ProxyGenerator::new(Config::default()).unwrap();
        let unit = generator
            .generate_file(&file("a.proto", vec![greeter()]))
            .unwrap()
            .unwrap();

        assert!(unit.content.ends_with("}\n"));
        assert!(!unit.content.ends_with("\n\n"));
    }
}
