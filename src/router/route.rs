//! Routes, match strategies, and per-route method maps.
//!
//! A [`Route`] binds one target specifier to a method map. The specifier's
//! shape picks the match strategy:
//!
//! | Target                  | Kind    | Matches                               |
//! |-------------------------|---------|---------------------------------------|
//! | `/cats/`                | Static  | exactly `/cats/`                      |
//! | `/cats/*`               | Prefix  | anything starting with `/cats/`       |
//! | `/cats/{id}`            | Pattern | one non-`/` segment captured as `id`  |
//! | `~^/cats/([0-9]+)$~`    | Pattern | the delimited expression, as written  |
//!
//! Matching is a pure call: [`Route::matches`] returns the outcome and the
//! captured variables together, so a route holds no per-match state and can
//! be shared across concurrently processed requests.

use std::collections::HashMap;

use regex::Regex;

use crate::error::DispatchError;
use crate::http::Method;
use crate::middleware::HandlerEntry;

/// Path variables captured by a successful pattern match, keyed by capture
/// group name.
pub type PathVariables = HashMap<String, String>;

/// Characters accepted as delimiters around a literal regular expression
/// target.
const PATTERN_DELIMITERS: [char; 3] = ['~', '#', '%'];

/// The match strategy a target compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Exact string equality with the target.
    Static,
    /// The path starts with the target (wildcard marker stripped).
    Prefix,
    /// The path matches a compiled regular expression.
    Pattern,
}

impl MatchKind {
    /// Classifies a target specifier.
    ///
    /// Checked in order: a trailing `*` makes a prefix; a matching pair of
    /// recognized delimiters (`~`, `#`, `%`) makes a literal-expression
    /// pattern; a `{name}` placeholder makes a template pattern; anything
    /// else is static.
    ///
    /// # Examples
    ///
    /// ```
    /// use relay::MatchKind;
    ///
    /// assert_eq!(MatchKind::of("/cats/"), MatchKind::Static);
    /// assert_eq!(MatchKind::of("/cats/*"), MatchKind::Prefix);
    /// assert_eq!(MatchKind::of("~/cat/[0-9]+~"), MatchKind::Pattern);
    /// assert_eq!(MatchKind::of("/cat/{id}"), MatchKind::Pattern);
    /// ```
    pub fn of(target: &str) -> MatchKind {
        if target.ends_with('*') {
            MatchKind::Prefix
        } else if delimited_expression(target).is_some()
            || (target.contains('{') && target.contains('}'))
        {
            MatchKind::Pattern
        } else {
            MatchKind::Static
        }
    }
}

// Returns the expression between a matching pair of recognized delimiters.
fn delimited_expression(target: &str) -> Option<&str> {
    let first = target.chars().next()?;
    if !PATTERN_DELIMITERS.contains(&first) {
        return None;
    }
    target[first.len_utf8()..].strip_suffix(first)
}

// Expands `{name}` placeholders into named capture groups matching one or
// more non-`/` characters, escaping the literal spans, and anchors the
// whole expression. A placeholder with an invalid group name fails to
// compile, which surfaces as an invalid-pattern error on first match.
fn compile_template(template: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(template.len() * 2);
    pattern.push('^');
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        pattern.push_str(&regex::escape(literal));
        match tail[1..].find('}') {
            Some(close) => {
                pattern.push_str("(?P<");
                pattern.push_str(&tail[1..1 + close]);
                pattern.push_str(">[^/]+)");
                rest = &tail[close + 2..];
            }
            None => {
                // Unterminated placeholder: treat the remainder literally.
                pattern.push_str(&regex::escape(tail));
                rest = "";
            }
        }
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');
    Regex::new(&pattern)
}

// A compiled match strategy. Pattern compilation happens once, at
// construction; a failed compilation is kept and reported on first use.
enum Matcher {
    Static(String),
    Prefix(String),
    Pattern(Result<Regex, regex::Error>),
}

impl Matcher {
    fn for_target(target: &str) -> Self {
        match MatchKind::of(target) {
            MatchKind::Static => Matcher::Static(target.to_owned()),
            MatchKind::Prefix => Matcher::Prefix(target.trim_end_matches('*').to_owned()),
            MatchKind::Pattern => Matcher::Pattern(match delimited_expression(target) {
                // A delimited expression is compiled as written; its own
                // anchoring (or lack of it) applies.
                Some(expression) => Regex::new(expression),
                None => compile_template(target),
            }),
        }
    }

    fn kind(&self) -> MatchKind {
        match self {
            Matcher::Static(_) => MatchKind::Static,
            Matcher::Prefix(_) => MatchKind::Prefix,
            Matcher::Pattern(_) => MatchKind::Pattern,
        }
    }
}

/// One registered routing rule.
///
/// Holds the raw target (the identity used when registrations merge), the
/// compiled match strategy, and the method map naming which handler chain
/// serves each HTTP method.
pub struct Route {
    target: String,
    matcher: Matcher,
    methods: MethodMap,
}

impl Route {
    /// Compiles a route for the given target specifier.
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        let matcher = Matcher::for_target(&target);
        Self {
            target,
            matcher,
            methods: MethodMap::new(),
        }
    }

    /// Returns the target specifier the route was registered with.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the match strategy this route uses.
    pub fn kind(&self) -> MatchKind {
        self.matcher.kind()
    }

    /// Returns the method map.
    pub fn methods(&self) -> &MethodMap {
        &self.methods
    }

    pub(crate) fn methods_mut(&mut self) -> &mut MethodMap {
        &mut self.methods
    }

    /// Tests `path` against this route's strategy.
    ///
    /// Returns `Ok(Some(variables))` on a match, with the variables captured
    /// by named groups (empty for static and prefix routes), `Ok(None)` on a
    /// miss, and `Err` if the route was registered with a malformed regular
    /// expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use relay::Route;
    ///
    /// let route = Route::new("/cats/{id}");
    /// let variables = route.matches("/cats/42").unwrap().unwrap();
    /// assert_eq!(variables["id"], "42");
    /// assert!(route.matches("/cats/42/toys").unwrap().is_none());
    /// ```
    pub fn matches(&self, path: &str) -> Result<Option<PathVariables>, DispatchError> {
        match &self.matcher {
            Matcher::Static(target) => Ok((path == target).then(PathVariables::new)),
            Matcher::Prefix(prefix) => Ok(path.starts_with(prefix).then(PathVariables::new)),
            Matcher::Pattern(compiled) => {
                let regex = compiled.as_ref().map_err(|source| {
                    DispatchError::InvalidPattern {
                        pattern: self.target.clone(),
                        source: source.clone(),
                    }
                })?;
                Ok(regex.captures(path).map(|captures| {
                    regex
                        .capture_names()
                        .flatten()
                        .filter_map(|name| {
                            captures
                                .name(name)
                                .map(|m| (name.to_owned(), m.as_str().to_owned()))
                        })
                        .collect()
                }))
            }
        }
    }
}

/// The method dispatch table of one route.
///
/// An ordered list of per-method entries (at most one per method name,
/// later registrations replace earlier ones) plus an explicit optional
/// wildcard entry serving any method not otherwise listed.
#[derive(Default)]
pub struct MethodMap {
    entries: Vec<(Method, HandlerEntry)>,
    wildcard: Option<HandlerEntry>,
}

impl MethodMap {
    /// Creates an empty method map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `entry` with `method`, replacing any existing association.
    pub fn insert(&mut self, method: Method, entry: HandlerEntry) {
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((method, entry)),
        }
    }

    /// Sets the wildcard entry serving methods with no exact association.
    pub fn set_wildcard(&mut self, entry: HandlerEntry) {
        self.wildcard = Some(entry);
    }

    /// Resolves the entry serving `method`.
    ///
    /// Lookup order: the exact method; for `HEAD`, the `GET` entry; the
    /// wildcard entry. `None` means the route cannot serve this method,
    /// which the router reports as a 405 outcome.
    pub fn resolve(&self, method: &Method) -> Option<&HandlerEntry> {
        self.exact(method)
            .or_else(|| (*method == Method::Head).then(|| self.exact(&Method::Get)).flatten())
            .or(self.wildcard.as_ref())
    }

    fn exact(&self, method: &Method) -> Option<&HandlerEntry> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, entry)| entry)
    }

    /// Lists the method names this map serves explicitly, in registration
    /// order, with `HEAD` appended when it is implied by a `GET` entry.
    ///
    /// Feeds the `Allow` header of 405 responses; the wildcard entry is not
    /// listed.
    pub fn allowed(&self) -> Vec<String> {
        let mut methods: Vec<String> = self
            .entries
            .iter()
            .map(|(m, _)| m.as_str().to_owned())
            .collect();
        let has = |name: &str| methods.iter().any(|m| m == name);
        if has("GET") && !has("HEAD") {
            methods.push("HEAD".to_owned());
        }
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Response, StatusCode};

    fn noop() -> HandlerEntry {
        HandlerEntry::terminal(|_request, response: Response| async move {
            Ok(response.with_status(StatusCode::Ok))
        })
    }

    // ── classification ───────────────────────────────────────────────────

    #[test]
    fn classifies_static_targets() {
        assert_eq!(MatchKind::of("/cats/"), MatchKind::Static);
        assert_eq!(MatchKind::of("/"), MatchKind::Static);
    }

    #[test]
    fn classifies_prefix_targets() {
        assert_eq!(MatchKind::of("/cats/*"), MatchKind::Prefix);
        assert_eq!(MatchKind::of("*"), MatchKind::Prefix);
    }

    #[test]
    fn classifies_delimited_expressions() {
        assert_eq!(MatchKind::of("~/cat/[0-9]+~"), MatchKind::Pattern);
        assert_eq!(MatchKind::of("#/cat/[0-9]+#"), MatchKind::Pattern);
    }

    #[test]
    fn classifies_templates() {
        assert_eq!(MatchKind::of("/cat/{id}"), MatchKind::Pattern);
    }

    #[test]
    fn lone_delimiter_is_static() {
        // No closing delimiter pair, no placeholder, no wildcard.
        assert_eq!(MatchKind::of("~"), MatchKind::Static);
        assert_eq!(MatchKind::of("~/cat"), MatchKind::Static);
    }

    // ── static routes ────────────────────────────────────────────────────

    #[test]
    fn static_route_requires_exact_equality() {
        let route = Route::new("/cats/");
        assert!(route.matches("/cats/").unwrap().is_some());
        assert!(route.matches("/cats").unwrap().is_none());
        assert!(route.matches("/cats//").unwrap().is_none());
    }

    #[test]
    fn static_route_captures_nothing() {
        let route = Route::new("/cats/");
        let variables = route.matches("/cats/").unwrap().unwrap();
        assert!(variables.is_empty());
    }

    // ── prefix routes ────────────────────────────────────────────────────

    #[test]
    fn prefix_route_matches_the_bare_prefix_and_any_suffix() {
        let route = Route::new("/cats/*");
        assert!(route.matches("/cats/").unwrap().is_some());
        assert!(route.matches("/cats/42").unwrap().is_some());
        assert!(route.matches("/cats/42/toys").unwrap().is_some());
        assert!(route.matches("/dogs/42").unwrap().is_none());
    }

    #[test]
    fn prefix_route_is_anchored_at_the_start() {
        let route = Route::new("/cats/*");
        assert!(route.matches("/all/cats/").unwrap().is_none());
    }

    #[test]
    fn bare_star_matches_everything() {
        let route = Route::new("*");
        assert_eq!(route.kind(), MatchKind::Prefix);
        assert!(route.matches("/anything/at/all").unwrap().is_some());
    }

    // ── template routes ──────────────────────────────────────────────────

    #[test]
    fn template_captures_the_substituted_segment() {
        let route = Route::new("/cats/{id}");
        let variables = route.matches("/cats/molly-42").unwrap().unwrap();
        assert_eq!(variables["id"], "molly-42");
    }

    #[test]
    fn template_rejects_slashes_inside_a_placeholder() {
        let route = Route::new("/cats/{id}");
        assert!(route.matches("/cats/42/toys").unwrap().is_none());
        assert!(route.matches("/cats/").unwrap().is_none());
    }

    #[test]
    fn template_is_anchored_to_the_whole_path() {
        let route = Route::new("/cats/{id}");
        assert!(route.matches("/cats/42").unwrap().is_some());
        assert!(route.matches("/herd/cats/42").unwrap().is_none());
    }

    #[test]
    fn template_with_multiple_placeholders() {
        let route = Route::new("/cats/{cat}/toys/{toy}");
        let variables = route.matches("/cats/7/toys/99").unwrap().unwrap();
        assert_eq!(variables["cat"], "7");
        assert_eq!(variables["toy"], "99");
    }

    #[test]
    fn template_literal_spans_are_escaped() {
        let route = Route::new("/v1.0/{id}");
        assert!(route.matches("/v1.0/42").unwrap().is_some());
        // An unescaped `.` would accept this.
        assert!(route.matches("/v1x0/42").unwrap().is_none());
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let route = Route::new("/cats/{id");
        assert!(route.matches("/cats/{id").unwrap().is_some());
        assert!(route.matches("/cats/42").unwrap().is_none());
    }

    // ── delimited expression routes ──────────────────────────────────────

    #[test]
    fn expression_route_uses_its_own_anchoring() {
        // Unanchored: a match anywhere in the path counts.
        let route = Route::new("~cats~");
        assert!(route.matches("/all/cats/42").unwrap().is_some());
        assert!(route.matches("/dogs").unwrap().is_none());
    }

    #[test]
    fn expression_route_exposes_named_captures_only() {
        let route = Route::new("~^/(?P<species>cats|dogs)/([0-9]+)$~");
        let variables = route.matches("/cats/42").unwrap().unwrap();
        assert_eq!(variables["species"], "cats");
        // The numeric group is not exposed.
        assert_eq!(variables.len(), 1);
    }

    #[test]
    fn malformed_expression_errors_on_match() {
        let route = Route::new("~/cat/[0-9+~");
        let err = route.matches("/cat/1").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPattern { .. }));
    }

    // ── method map ───────────────────────────────────────────────────────

    #[test]
    fn resolve_prefers_the_exact_method() {
        let mut map = MethodMap::new();
        map.insert(Method::Get, noop());
        map.set_wildcard(noop());
        assert!(map.resolve(&Method::Get).is_some());
        assert!(map.resolve(&Method::Post).is_some()); // wildcard
    }

    #[test]
    fn resolve_without_wildcard_misses_unregistered_methods() {
        let mut map = MethodMap::new();
        map.insert(Method::Get, noop());
        assert!(map.resolve(&Method::Delete).is_none());
    }

    #[test]
    fn head_falls_back_to_get() {
        let mut map = MethodMap::new();
        map.insert(Method::Get, noop());
        assert!(map.resolve(&Method::Head).is_some());
    }

    #[test]
    fn insert_replaces_an_existing_entry() {
        let mut map = MethodMap::new();
        map.insert(Method::Get, noop());
        map.insert(Method::Get, noop());
        assert_eq!(map.allowed(), ["GET", "HEAD"]);
    }

    #[test]
    fn allowed_appends_head_implied_by_get() {
        let mut map = MethodMap::new();
        map.insert(Method::Get, noop());
        map.insert(Method::Put, noop());
        assert_eq!(map.allowed(), ["GET", "PUT", "HEAD"]);
    }

    #[test]
    fn allowed_does_not_duplicate_an_explicit_head() {
        let mut map = MethodMap::new();
        map.insert(Method::Get, noop());
        map.insert(Method::Head, noop());
        assert_eq!(map.allowed(), ["GET", "HEAD"]);
    }
}
