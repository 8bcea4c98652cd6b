//! Protobuf plugin request parser
//!
//! Decodes the `CodeGeneratorRequest` protoc writes to a plugin's stdin and
//! links its `FileDescriptorProto`s into a descriptor pool.
//!
//! ## Example
//! ```rust,ignore
//! use grpcproxy_parser::RequestParser;
//!
//! let parser = RequestParser::from_bytes(&stdin_bytes)?;
//! let config = parser.config()?;
//! let files = parser.parse(&config)?;
//! ```

mod converter;
mod go_package;
mod parser;

pub use go_package::GoPackage;
pub use parser::{decode_request, RequestParser};
