//! Route table compilation and request matching.
//!
//! Route patterns are strings of the form `[VERB ]path`, where the path may
//! contain `*` wildcards (any run of characters, non-greedy) and `[name]`
//! parameters (one or more non-separator characters). Patterns compile once
//! into anchored, case-insensitive regexes at gate construction; matching is
//! first-declared-wins over normalized paths.

use regex::{Regex, RegexBuilder};

use crate::error::GateError;
use crate::types::RouteConfig;

/// Ordered route table: pattern strings mapped to route configurations.
///
/// Two declaration shapes are supported and normalized into one canonical
/// representation at construction:
///
/// - [`RoutesConfig::all`] — a single config applied to every path;
/// - the builder form — one config per pattern, declaration order preserved.
///
/// # Example
///
/// ```no_run
/// use gate402_http::routes::RoutesConfig;
/// use gate402_http::types::{PaymentOption, RouteConfig};
///
/// let routes = RoutesConfig::new()
///     .route("GET /weather", RouteConfig::single(PaymentOption::new(
///         "exact", "eip155:8453", "0xRecipient", serde_json::json!("0.01"),
///     )))
///     .route("/premium/*", RouteConfig::single(PaymentOption::new(
///         "exact", "eip155:8453", "0xRecipient", serde_json::json!("0.10"),
///     )));
/// ```
#[derive(Debug, Default)]
pub struct RoutesConfig {
    entries: Vec<(String, RouteConfig)>,
}

impl RoutesConfig {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a table with a single config applied to all paths and verbs.
    #[must_use]
    pub fn all(config: RouteConfig) -> Self {
        Self {
            entries: vec![("*".to_owned(), config)],
        }
    }

    /// Appends a pattern/config pair. Declaration order determines match
    /// priority: the first matching route wins.
    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>, config: RouteConfig) -> Self {
        self.entries.push((pattern.into(), config));
        self
    }

    pub(crate) fn into_entries(self) -> Vec<(String, RouteConfig)> {
        self.entries
    }
}

/// A compiled route: verb, matcher, and config. Immutable once built.
#[derive(Debug)]
pub(crate) struct CompiledRoute {
    /// Uppercase HTTP method, or `"*"` for any method.
    pub method: String,
    /// The original pattern text, kept for diagnostics.
    pub pattern: String,
    /// Anchored, case-insensitive matcher over normalized paths.
    pub matcher: Regex,
    /// Payment configuration for this route.
    pub config: RouteConfig,
}

impl CompiledRoute {
    /// Checks whether this route matches the given method and normalized path.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        if self.method != "*" && !self.method.eq_ignore_ascii_case(method) {
            return false;
        }
        self.matcher.is_match(path)
    }
}

/// Compiles the route table into an ordered matcher list.
///
/// # Errors
///
/// Returns [`GateError::InvalidPattern`] if a pattern cannot compile and
/// [`GateError::EmptyPaymentOptions`] if a route declares no options.
pub(crate) fn compile_routes(routes: RoutesConfig) -> Result<Vec<CompiledRoute>, GateError> {
    routes
        .into_entries()
        .into_iter()
        .map(|(pattern, config)| {
            if config.accepts.is_empty() {
                return Err(GateError::EmptyPaymentOptions {
                    pattern: pattern.clone(),
                });
            }
            let (method, path) = parse_route_pattern(&pattern);
            let matcher = compile_pattern(&path).map_err(|e| GateError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            Ok(CompiledRoute {
                method,
                pattern,
                matcher,
                config,
            })
        })
        .collect()
}

/// Parses a route pattern string into method + path.
///
/// - `"GET /weather"` → method=`GET`, path=`/weather`
/// - `"/weather"` → method=`*`, path=`/weather`
/// - `"*"` → method=`*`, path=`*`
///
/// A single trailing separator is stripped from the path (but never the
/// root), mirroring what [`normalize_path`] does to incoming paths so that
/// `"GET /api/data/"` still matches requests for `/api/data`.
pub(crate) fn parse_route_pattern(pattern: &str) -> (String, String) {
    let trimmed = pattern.trim();
    let (method, mut path) =
        if let Some((method, path)) = trimmed.split_once(char::is_whitespace) {
            (method.to_uppercase(), path.trim().to_owned())
        } else {
            ("*".to_owned(), trimmed.to_owned())
        };
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    (method, path)
}

/// Compiles a path pattern into an anchored, case-insensitive regex.
///
/// `*` matches any run of characters lazily; `[name]` matches one or more
/// non-separator characters. Every other character is matched literally.
/// An unterminated `[` is treated as a literal bracket.
fn compile_pattern(path: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(path.len() + 8);
    source.push('^');

    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => source.push_str(".*?"),
            '[' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == ']' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if closed && !name.is_empty() {
                    source.push_str("[^/]+");
                } else {
                    source.push_str(&regex::escape("["));
                    source.push_str(&regex::escape(&name));
                    if closed {
                        source.push_str(&regex::escape("]"));
                    }
                }
            }
            other => {
                let mut buf = [0u8; 4];
                source.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    source.push('$');
    RegexBuilder::new(&source).case_insensitive(true).build()
}

/// Normalizes a request path for matching.
///
/// Strips query and fragment, percent-decodes (every escape except `%25`,
/// `%3F`, and `%23`), canonicalizes backslashes to forward slashes,
/// collapses repeated separators, and strips a single trailing separator
/// (but never the root). Idempotent over its own output.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let stripped = path.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_stable(stripped);

    let mut out = String::with_capacity(decoded.len());
    let mut prev_sep = false;
    for raw in decoded.chars() {
        let c = if raw == '\\' { '/' } else { raw };
        if c == '/' {
            if prev_sep {
                continue;
            }
            prev_sep = true;
        } else {
            prev_sep = false;
        }
        out.push(c);
    }

    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Percent-decodes every escape except those the normalizer would itself
/// re-interpret: `%25` (`%`), `%3F` (`?`), and `%23` (`#`).
///
/// Decoding `%25` would emit a `%` that can pair with following characters
/// into a new decodable escape (`%2520` → `%20` → a space); decoding `%3F`
/// or `%23` would emit a byte the query/fragment strip consumes. Either way
/// a second pass would see different input. Keeping those three encoded
/// keeps a single pass stable: the output never contains a sequence that
/// would decode or strip again.
fn percent_decode_stable(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                let decoded = hi * 16 + lo;
                if !matches!(decoded, b'%' | b'?' | b'#') {
                    out.push(decoded);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentOption, RouteConfig};
    use serde_json::json;

    fn config(price: &str) -> RouteConfig {
        RouteConfig::single(PaymentOption::new(
            "exact",
            "eip155:8453",
            "0xRecipient",
            json!(price),
        ))
    }

    fn compiled(pattern: &str) -> CompiledRoute {
        compile_routes(RoutesConfig::new().route(pattern, config("0.01")))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn normalization_strips_query_fragment_and_trailing_slash() {
        assert_eq!(normalize_path("/api/data?q=1#frag"), "/api/data");
        assert_eq!(normalize_path("/api/data/"), "/api/data");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn normalization_decodes_and_canonicalizes_separators() {
        assert_eq!(normalize_path("/api/%64ata"), "/api/data");
        assert_eq!(normalize_path("\\api\\\\data"), "/api/data");
        assert_eq!(normalize_path("/api///data"), "/api/data");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "/api/data?x=1",
            "/a//b\\c/",
            "/items/42",
            "/",
            "/files/a%2520b",
            "/literal%25percent",
            "/q%3Fmark",
            "/frag%23ment",
        ] {
            let once = normalize_path(raw);
            assert_eq!(normalize_path(&once), once);
        }
    }

    #[test]
    fn double_encoded_escapes_stay_encoded() {
        // Decoding %25 would create a fresh %20 escape and a second pass
        // would see different input; it stays literal instead.
        assert_eq!(normalize_path("/files/a%2520b"), "/files/a%2520b");
        assert_eq!(normalize_path("/files/a%20b"), "/files/a b");
        assert_eq!(normalize_path("/odd%4"), "/odd%4");
    }

    #[test]
    fn escapes_for_query_and_fragment_bytes_stay_encoded() {
        // Decoded ? and # would be consumed by the query/fragment strip on
        // a second pass; they stay literal instead.
        assert_eq!(normalize_path("/q%3Fmark"), "/q%3Fmark");
        assert_eq!(normalize_path("/frag%23ment"), "/frag%23ment");
    }

    #[test]
    fn wildcard_matches_nested_paths_but_respects_verb() {
        let route = compiled("GET /api/*");
        assert!(route.matches("GET", "/api/anything/nested"));
        assert!(route.matches("get", "/api/x"));
        assert!(!route.matches("POST", "/api/anything"));
    }

    #[test]
    fn parameter_is_separator_bounded() {
        let route = compiled("/items/[id]");
        assert!(route.matches("GET", "/items/42"));
        assert!(route.matches("DELETE", "/items/abc-def"));
        assert!(!route.matches("GET", "/items/42/sub"));
        assert!(!route.matches("GET", "/items/"));
    }

    #[test]
    fn literal_patterns_do_not_leak_regex_metacharacters() {
        let route = compiled("/v1.0/data");
        assert!(route.matches("GET", "/v1.0/data"));
        assert!(!route.matches("GET", "/v1x0/data"));
    }

    #[test]
    fn unterminated_bracket_is_literal() {
        let route = compiled("/odd[path");
        assert!(route.matches("GET", "/odd[path"));
        assert!(!route.matches("GET", "/oddX"));
    }

    #[test]
    fn trailing_slash_in_pattern_matches_normalized_paths() {
        let route = compiled("GET /api/data/");
        assert!(route.matches("GET", "/api/data"));
        assert!(route.matches("GET", &normalize_path("/api/data/")));

        let root = compiled("GET /");
        assert!(root.matches("GET", "/"));
    }

    #[test]
    fn matching_is_case_insensitive_on_path_and_verb() {
        let route = compiled("get /API/data");
        assert!(route.matches("GET", "/api/DATA"));
    }

    #[test]
    fn first_declared_route_wins() {
        let routes = compile_routes(
            RoutesConfig::new()
                .route("/api/special", config("0.05"))
                .route("/api/*", config("0.01")),
        )
        .unwrap();

        let hit = routes
            .iter()
            .find(|r| r.matches("GET", "/api/special"))
            .unwrap();
        assert_eq!(hit.pattern, "/api/special");
    }

    #[test]
    fn all_routes_shape_matches_everything() {
        let routes = compile_routes(RoutesConfig::all(config("0.01"))).unwrap();
        assert!(routes[0].matches("POST", "/anything/at/all"));
    }

    #[test]
    fn empty_payment_options_are_rejected_at_compile_time() {
        let empty = RouteConfig::multi(Vec::new());
        let err = compile_routes(RoutesConfig::new().route("/x", empty)).unwrap_err();
        assert!(matches!(err, GateError::EmptyPaymentOptions { .. }));
    }
}
