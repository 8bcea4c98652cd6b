//! Go import bookkeeping for generated files

use grpcproxy_common::naming::{base_name, go_sanitized};
use grpcproxy_common::GoIdent;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Import paths of the packages every proxy file may depend on
pub const CONTEXT_PACKAGE: &str = "context";
pub const ERRORS_PACKAGE: &str = "errors";
pub const NET_PACKAGE: &str = "net";
pub const GRPC_PACKAGE: &str = "google.golang.org/grpc";
pub const EMPTY_PACKAGE: &str = "google.golang.org/protobuf/types/known/emptypb";

/// Fully-qualified protobuf name of the well-known empty message
pub const EMPTY_MESSAGE: &str = "google.protobuf.Empty";

/// Reference to the well-known empty message, used whatever the local alias
pub const EMPTY_MESSAGE_REF: &str = "emptypb.Empty";

/// One line of the generated import block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub alias: String,
    pub path: String,
}

/// Import paths of a file mapped to the alias they are imported under
///
/// Aliases are handed out first come first served; a clash gets a numeric
/// suffix, the same way protoc-gen-go disambiguates package names.
#[derive(Debug, Default, Clone)]
pub struct ImportSet {
    aliases: BTreeMap<String, String>,
    taken: HashSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path`, preferring `name` as its alias, and return the alias
    pub fn add(&mut self, path: &str, name: &str) -> &str {
        if !self.aliases.contains_key(path) {
            let base = go_sanitized(name);
            let mut alias = base.clone();
            let mut n = 1;
            while self.taken.contains(&alias) {
                alias = format!("{}{}", base, n);
                n += 1;
            }
            self.taken.insert(alias.clone());
            self.aliases.insert(path.to_string(), alias);
        }
        &self.aliases[path]
    }

    /// Register a standard package whose alias is its last path element
    pub fn add_package(&mut self, path: &str) -> &str {
        self.add(path, base_name(path))
    }

    pub fn alias(&self, path: &str) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    /// Import lines sorted by path, as gofmt orders them
    pub fn to_imports(&self) -> Vec<Import> {
        self.aliases
            .iter()
            .map(|(path, alias)| Import {
                alias: alias.clone(),
                path: path.clone(),
            })
            .collect()
    }
}

/// Identifiers visible from the file being generated
///
/// `local_import_path` is the package the generated file belongs to;
/// identifiers from it are used bare, everything else goes through an
/// import alias.
#[derive(Debug, Clone)]
pub struct TypeScope {
    local_import_path: String,
    imports: ImportSet,
}

impl TypeScope {
    pub fn new(local_import_path: impl Into<String>, imports: ImportSet) -> Self {
        Self {
            local_import_path: local_import_path.into(),
            imports,
        }
    }

    /// Render `ident` as it must be spelled inside the generated file
    pub fn qualify(&self, ident: &GoIdent) -> String {
        if ident.import_path == self.local_import_path {
            return ident.name.clone();
        }
        match self.imports.alias(&ident.import_path) {
            Some(alias) => format!("{}.{}", alias, ident.name),
            None => ident.name.clone(),
        }
    }

    pub fn imports(&self) -> &ImportSet {
        &self.imports
    }
}
