//! Go identifier naming
//!
//! The proxy has to refer to identifiers produced by protoc-gen-go and
//! protoc-gen-go-grpc, so the conversions here reproduce their rules
//! exactly rather than approximating them.

/// Go keywords, which cannot be used as package names
const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Convert a protobuf name to the CamelCase Go name protoc-gen-go uses
///
/// Dots separate nested declarations and become underscores unless the next
/// segment starts lower-case.
///
/// # Examples
/// ```
/// use grpcproxy_common::naming::go_camel_case;
///
/// assert_eq!(go_camel_case("say_hello"), "SayHello");
/// assert_eq!(go_camel_case("Outer.Inner"), "Outer_Inner");
/// ```
pub fn go_camel_case(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let next_is_lower = i + 1 < bytes.len() && bytes[i + 1].is_ascii_lowercase();

        if c == b'.' && next_is_lower {
            // ".x" is dropped, the letter is capitalized below
        } else if c == b'.' {
            out.push(b'_');
        } else if c == b'_' && (i == 0 || bytes[i - 1] == b'.') {
            out.push(b'X');
        } else if c == b'_' && next_is_lower {
            // "_x" is dropped, the letter is capitalized below
        } else if c.is_ascii_digit() {
            out.push(c);
        } else {
            out.push(c.to_ascii_uppercase());
            while i + 1 < bytes.len() && bytes[i + 1].is_ascii_lowercase() {
                i += 1;
                out.push(bytes[i]);
            }
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Convert a Go name to lowerCamelCase
///
/// Runs of capitals collapse (`HTTPService` -> `httpservice`), and a
/// separator or digit capitalizes the next letter.
pub fn lower_camel(s: &str) -> String {
    let s = s.trim();
    let mut out = String::with_capacity(s.len());
    let mut cap_next = false;
    let mut prev_is_cap = false;

    for (i, &b) in s.as_bytes().iter().enumerate() {
        let is_cap = b.is_ascii_uppercase();
        let is_low = b.is_ascii_lowercase();
        let mut v = b;

        if cap_next {
            v = v.to_ascii_uppercase();
        } else if i == 0 || (prev_is_cap && is_cap) {
            v = v.to_ascii_lowercase();
        }
        prev_is_cap = is_cap;

        if is_cap || is_low {
            out.push(v as char);
            cap_next = false;
        } else if b.is_ascii_digit() {
            out.push(v as char);
            cap_next = true;
        } else {
            cap_next = matches!(b, b'_' | b' ' | b'-' | b'.');
        }
    }

    out
}

/// Turn an arbitrary string into a valid Go package identifier
///
/// # Examples
/// ```
/// use grpcproxy_common::naming::go_sanitized;
///
/// assert_eq!(go_sanitized("hello-world"), "hello_world");
/// assert_eq!(go_sanitized("type"), "_type");
/// ```
pub fn go_sanitized(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    let starts_with_letter = sanitized.chars().next().is_some_and(char::is_alphabetic);
    if !starts_with_letter || GO_KEYWORDS.contains(&sanitized.as_str()) {
        format!("_{}", sanitized)
    } else {
        sanitized
    }
}

/// Last element of a slash-separated path
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
