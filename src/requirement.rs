//! Requirement specifier parsing.
//!
//! Parses one entry of a requirements file, such as
//! `requests[socks,security]>=2.8; python_version < "3.12"` or
//! `mylib @ git+https://example.com/mylib.git`, into its name, extras,
//! version specifiers, direct URL and environment marker.
//!
//! The grammar follows the dependency specifier format used by pip.
//! Lines that pip would only accept as options (`-r`, `-e`, `--hash`) or
//! that carry trailing comments are rejected with a [`RequirementParseError`].
//!
//! # Example
//!
//! ```
//! use reqpin::requirement::Requirement;
//!
//! let req: Requirement = "flask[async]>=2.0".parse().unwrap();
//! assert_eq!(req.name, "flask");
//! assert!(req.extras.contains("async"));
//! assert!(req.has_specifier());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?").expect("NAME_REGEX must compile")
});

static SPEC_OP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:===|~=|==|!=|<=|>=|<|>)").expect("SPEC_OP_REGEX must compile")
});

static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.*+!-]+").expect("VERSION_REGEX must compile")
});

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^ \t]+").expect("URL_REGEX must compile"));

static MARKER_VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:platform_python_implementation|python_implementation|implementation_version|implementation_name|python_full_version|platform_release|platform_version|platform_machine|platform_system|python_version|sys_platform|os_name|platform\.python_implementation|platform\.version|platform\.machine|sys\.platform|os\.name|dependency_groups|extras|extra)\b",
    )
    .expect("MARKER_VAR_REGEX must compile")
});

static MARKER_OP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:===|==|!=|<=|>=|~=|<|>|not[ \t]+in\b|in\b)")
        .expect("MARKER_OP_REGEX must compile")
});

static QUOTED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:'([^']*)'|"([^"]*)")"#).expect("QUOTED_REGEX must compile")
});

static BOOL_OP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:and|or)\b").expect("BOOL_OP_REGEX must compile"));

/// Error raised when a line does not match the requirement grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct RequirementParseError {
    /// Byte offset into the input where parsing stopped.
    pub position: usize,
    /// What the parser expected to find.
    pub message: String,
}

/// A parsed requirement specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name, spelled as written.
    pub name: String,
    /// Requested extras, kept in sorted order.
    pub extras: BTreeSet<String>,
    /// Version clauses; empty when the entry is unconstrained.
    pub specifier: Vec<VersionSpecifier>,
    /// Direct reference (`name @ url`), if any.
    pub url: Option<String>,
    /// Environment marker after `;`, if any.
    pub marker: Option<Marker>,
}

impl Requirement {
    /// Parse a single requirement line.
    pub fn parse(input: &str) -> Result<Self, RequirementParseError> {
        Parser::new(input).requirement()
    }

    /// Whether the entry carries at least one version clause.
    pub fn has_specifier(&self) -> bool {
        !self.specifier.is_empty()
    }
}

impl FromStr for Requirement {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Comparison operator of a version clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecOperator {
    /// `===`
    ArbitraryEqual,
    /// `~=`
    Compatible,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
}

impl SpecOperator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "===" => Some(Self::ArbitraryEqual),
            "~=" => Some(Self::Compatible),
            "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "<=" => Some(Self::LessEqual),
            ">=" => Some(Self::GreaterEqual),
            "<" => Some(Self::Less),
            ">" => Some(Self::Greater),
            _ => None,
        }
    }

    /// The operator as written in a requirements file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArbitraryEqual => "===",
            Self::Compatible => "~=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::Greater => ">",
        }
    }
}

impl fmt::Display for SpecOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `op version` clause, e.g. `>=2.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifier {
    pub operator: SpecOperator,
    pub version: String,
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// An environment marker expression.
///
/// The expression is stored as a flat sequence of comparisons, boolean
/// operators and parenthesized groups, which keeps the grouping the author
/// wrote. [`fmt::Display`] renders the canonical form with single spaces
/// and double-quoted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    nodes: Vec<MarkerNode>,
}

/// Element of a [`Marker`] sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerNode {
    Comparison(MarkerComparison),
    Group(Vec<MarkerNode>),
    And,
    Or,
}

/// `left op right`, e.g. `python_version >= "3.8"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerComparison {
    pub left: MarkerValue,
    pub op: String,
    pub right: MarkerValue,
}

/// Operand of a marker comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerValue {
    /// An environment variable such as `sys_platform`.
    Variable(String),
    /// A quoted literal, stored without quotes.
    Literal(String),
}

impl Marker {
    /// The top-level node sequence.
    pub fn nodes(&self) -> &[MarkerNode] {
        &self.nodes
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_nodes(&self.nodes, true))
    }
}

// Single-element groups are unwrapped; only multi-element groups below the
// top level keep their parentheses.
fn format_nodes(nodes: &[MarkerNode], top: bool) -> String {
    if let [only] = nodes {
        return match only {
            MarkerNode::Group(inner) => format_nodes(inner, top),
            other => format_node(other),
        };
    }

    let joined = nodes
        .iter()
        .map(format_node)
        .collect::<Vec<_>>()
        .join(" ");

    if top {
        joined
    } else {
        format!("({joined})")
    }
}

fn format_node(node: &MarkerNode) -> String {
    match node {
        MarkerNode::Comparison(cmp) => cmp.to_string(),
        MarkerNode::Group(inner) => format_nodes(inner, false),
        MarkerNode::And => "and".to_string(),
        MarkerNode::Or => "or".to_string(),
    }
}

impl fmt::Display for MarkerComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => f.write_str(name),
            Self::Literal(value) if value.contains('"') => write!(f, "'{value}'"),
            Self::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

/// Aliases accepted in markers, mapped to their canonical variable name.
fn canonical_variable(name: &str) -> &str {
    match name {
        "python_implementation" | "platform.python_implementation" => {
            "platform_python_implementation"
        }
        "platform.version" => "platform_version",
        "platform.machine" => "platform_machine",
        "sys.platform" => "sys_platform",
        "os.name" => "os_name",
        other => other,
    }
}

/// Recursive-descent parser over one input line.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Skip spaces and tabs, returning whether any was consumed.
    ///
    /// Other Unicode whitespace is not a separator in the grammar.
    fn skip_ws(&mut self) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t']);
        self.pos += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_regex(&mut self, regex: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        let found = regex.find(rest)?;
        self.pos += found.end();
        Some(&rest[..found.end()])
    }

    fn error(&self, message: impl Into<String>) -> RequirementParseError {
        RequirementParseError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn requirement(mut self) -> Result<Requirement, RequirementParseError> {
        self.skip_ws();
        let name = self
            .eat_regex(&NAME_REGEX)
            .ok_or_else(|| self.error("Expected package name at the start of dependency specifier"))?
            .to_string();
        self.skip_ws();

        let extras = self.extras()?;
        self.skip_ws();

        let mut requirement = Requirement {
            name,
            extras,
            specifier: Vec::new(),
            url: None,
            marker: None,
        };

        if self.eat("@") {
            self.skip_ws();
            let url = self
                .eat_regex(&URL_REGEX)
                .ok_or_else(|| self.error("Expected URL after @"))?;
            requirement.url = Some(url.to_string());

            if self.at_end() {
                return Ok(requirement);
            }
            if !self.skip_ws() {
                return Err(self.error("Expected whitespace after URL"));
            }
            if self.at_end() {
                return Ok(requirement);
            }
            if !self.eat(";") {
                return Err(self.error("Expected end or semicolon (after URL and whitespace)"));
            }
            requirement.marker = Some(self.marker_tail()?);
            return Ok(requirement);
        }

        requirement.specifier = self.specifier()?;
        self.skip_ws();

        if self.at_end() {
            return Ok(requirement);
        }
        if !self.eat(";") {
            let context = if requirement.has_specifier() {
                "Expected end or semicolon (after version specifier)"
            } else {
                "Expected end or semicolon (after name and no valid version specifier)"
            };
            return Err(self.error(context));
        }
        requirement.marker = Some(self.marker_tail()?);
        Ok(requirement)
    }

    fn extras(&mut self) -> Result<BTreeSet<String>, RequirementParseError> {
        let mut extras = BTreeSet::new();
        if !self.eat("[") {
            return Ok(extras);
        }
        self.skip_ws();
        if self.eat("]") {
            return Ok(extras);
        }

        loop {
            self.skip_ws();
            let extra = self
                .eat_regex(&NAME_REGEX)
                .ok_or_else(|| self.error("Expected extra name"))?;
            extras.insert(extra.to_string());
            self.skip_ws();

            if self.eat(",") {
                continue;
            }
            if self.eat("]") {
                return Ok(extras);
            }
            return Err(self.error("Expected comma between extra names or closing bracket"));
        }
    }

    fn specifier(&mut self) -> Result<Vec<VersionSpecifier>, RequirementParseError> {
        if self.eat("(") {
            self.skip_ws();
            let clauses = self.version_many()?;
            self.skip_ws();
            if !self.eat(")") {
                return Err(self.error("Expected closing parenthesis after version specifier"));
            }
            return Ok(clauses);
        }
        self.version_many()
    }

    fn version_many(&mut self) -> Result<Vec<VersionSpecifier>, RequirementParseError> {
        let mut clauses = Vec::new();
        let Some(first) = self.version_clause()? else {
            return Ok(clauses);
        };
        clauses.push(first);

        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if !self.eat(",") {
                self.pos = checkpoint;
                return Ok(clauses);
            }
            self.skip_ws();
            match self.version_clause()? {
                Some(clause) => clauses.push(clause),
                None => return Err(self.error("Expected version specifier after comma")),
            }
        }
    }

    fn version_clause(&mut self) -> Result<Option<VersionSpecifier>, RequirementParseError> {
        let Some(token) = self.eat_regex(&SPEC_OP_REGEX) else {
            return Ok(None);
        };
        let operator = SpecOperator::from_token(token)
            .ok_or_else(|| self.error(format!("Unknown version operator {token}")))?;
        self.skip_ws();
        let version = self
            .eat_regex(&VERSION_REGEX)
            .ok_or_else(|| self.error(format!("Expected version after {token}")))?;
        Ok(Some(VersionSpecifier {
            operator,
            version: version.to_string(),
        }))
    }

    /// Parse the marker after `;` through the end of input.
    fn marker_tail(&mut self) -> Result<Marker, RequirementParseError> {
        self.skip_ws();
        let nodes = self.marker_or()?;
        self.skip_ws();
        if !self.at_end() {
            return Err(self.error("Expected end of marker expression"));
        }
        Ok(Marker { nodes })
    }

    // `and` binds tighter than `or`, but grouping is only recorded for
    // explicit parentheses, so both levels append to one flat sequence.
    fn marker_or(&mut self) -> Result<Vec<MarkerNode>, RequirementParseError> {
        let mut nodes = Vec::new();
        nodes.push(self.marker_item()?);

        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            match self.eat_regex(&BOOL_OP_REGEX) {
                Some("and") => nodes.push(MarkerNode::And),
                Some(_) => nodes.push(MarkerNode::Or),
                None => {
                    self.pos = checkpoint;
                    return Ok(nodes);
                }
            }
            self.skip_ws();
            nodes.push(self.marker_item()?);
        }
    }

    fn marker_item(&mut self) -> Result<MarkerNode, RequirementParseError> {
        self.skip_ws();
        if self.eat("(") {
            let inner = self.marker_or()?;
            self.skip_ws();
            if !self.eat(")") {
                return Err(self.error("Expected closing parenthesis in marker"));
            }
            return Ok(MarkerNode::Group(inner));
        }

        let left = self.marker_value()?;
        self.skip_ws();
        let op = self
            .eat_regex(&MARKER_OP_REGEX)
            .ok_or_else(|| self.error("Expected marker operator"))?;
        let op = op.split_whitespace().collect::<Vec<_>>().join(" ");
        self.skip_ws();
        let right = self.marker_value()?;

        Ok(MarkerNode::Comparison(MarkerComparison { left, op, right }))
    }

    fn marker_value(&mut self) -> Result<MarkerValue, RequirementParseError> {
        if let Some(variable) = self.eat_regex(&MARKER_VAR_REGEX) {
            return Ok(MarkerValue::Variable(canonical_variable(variable).to_string()));
        }

        let rest = self.rest();
        let captures = QUOTED_REGEX
            .captures(rest)
            .ok_or_else(|| self.error("Expected a marker variable or quoted string"))?;
        let whole = captures.get(0).map_or(0, |m| m.end());
        let value = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map_or("", |m| m.as_str())
            .to_string();
        self.pos += whole;
        Ok(MarkerValue::Literal(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Requirement {
        Requirement::parse(input).unwrap()
    }

    #[test]
    fn parses_bare_name() {
        let req = parse("numpy");
        assert_eq!(req.name, "numpy");
        assert!(req.extras.is_empty());
        assert!(!req.has_specifier());
        assert!(req.url.is_none());
        assert!(req.marker.is_none());
    }

    #[test]
    fn keeps_name_spelling() {
        assert_eq!(parse("Django_REST.framework").name, "Django_REST.framework");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let req = parse("  requests  ");
        assert_eq!(req.name, "requests");
        assert!(!req.has_specifier());
    }

    #[test]
    fn parses_extras_sorted() {
        let req = parse("requests[socks, security]");
        let extras: Vec<_> = req.extras.iter().cloned().collect();
        assert_eq!(extras, vec!["security", "socks"]);
    }

    #[test]
    fn parses_empty_extras() {
        let req = parse("requests[]");
        assert!(req.extras.is_empty());
    }

    #[test]
    fn parses_single_clause() {
        let req = parse("flask[async]>=2.0");
        assert_eq!(req.specifier.len(), 1);
        assert_eq!(req.specifier[0].operator, SpecOperator::GreaterEqual);
        assert_eq!(req.specifier[0].version, "2.0");
    }

    #[test]
    fn parses_multiple_clauses() {
        let req = parse("django >= 4.2 , < 5");
        let rendered: Vec<_> = req.specifier.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec![">=4.2", "<5"]);
    }

    #[test]
    fn parses_parenthesized_clauses() {
        let req = parse("name (>=1.0,!=1.3.*)");
        assert_eq!(req.specifier.len(), 2);
        assert_eq!(req.specifier[1].operator, SpecOperator::NotEqual);
        assert_eq!(req.specifier[1].version, "1.3.*");
    }

    #[test]
    fn parses_every_operator() {
        for op in ["===", "~=", "==", "!=", "<=", ">=", "<", ">"] {
            let req = parse(&format!("pkg{op}1.0"));
            assert_eq!(req.specifier[0].operator.as_str(), op);
        }
    }

    #[test]
    fn parses_url_reference() {
        let req = parse("mylib @ git+https://example.com/mylib.git");
        assert_eq!(req.url.as_deref(), Some("git+https://example.com/mylib.git"));
        assert!(!req.has_specifier());
    }

    #[test]
    fn parses_url_with_marker() {
        let req = parse("pip @ https://example.com/pip.whl ; python_version >= '3.8'");
        assert!(req.url.is_some());
        assert_eq!(req.marker.unwrap().to_string(), r#"python_version >= "3.8""#);
    }

    #[test]
    fn rejects_marker_glued_to_url() {
        assert!(Requirement::parse("pip @ https://example.com/pip.whl extra").is_err());
    }

    #[test]
    fn parses_marker_without_specifier() {
        let req = parse("pywin32; sys_platform == 'win32'");
        assert!(!req.has_specifier());
        assert_eq!(req.marker.unwrap().to_string(), r#"sys_platform == "win32""#);
    }

    #[test]
    fn canonicalizes_marker_spacing() {
        let req = parse(r#"typing-extensions;python_version<"3.8""#);
        assert_eq!(req.marker.unwrap().to_string(), r#"python_version < "3.8""#);
    }

    #[test]
    fn keeps_boolean_structure_and_groups() {
        let req = parse(
            "pkg; os_name == 'nt' and (python_version < '3.8' or platform_machine == 'x86')",
        );
        assert_eq!(
            req.marker.unwrap().to_string(),
            r#"os_name == "nt" and (python_version < "3.8" or platform_machine == "x86")"#
        );
    }

    #[test]
    fn unwraps_redundant_groups() {
        let req = parse("pkg; ((python_version < '3.8'))");
        assert_eq!(req.marker.unwrap().to_string(), r#"python_version < "3.8""#);
    }

    #[test]
    fn normalizes_not_in_operator() {
        let req = parse("pkg; 'linux' not   in sys_platform");
        assert_eq!(
            req.marker.unwrap().to_string(),
            r#""linux" not in sys_platform"#
        );
    }

    #[test]
    fn maps_variable_aliases() {
        let req = parse("pkg; python_implementation == 'CPython'");
        assert_eq!(
            req.marker.unwrap().to_string(),
            r#"platform_python_implementation == "CPython""#
        );
    }

    #[test]
    fn rejects_non_ascii_whitespace() {
        assert!(Requirement::parse("numpy\u{a0}").is_err());
        assert!(Requirement::parse("numpy\u{3000}; os_name == 'nt'").is_err());
        assert!(Requirement::parse("\u{a0}numpy").is_err());
    }

    #[test]
    fn accepts_tabs_as_whitespace() {
        let req = parse("\tnumpy\t>=\t1.0\t");
        assert_eq!(req.specifier[0].version, "1.0");
    }

    #[test]
    fn rejects_trailing_comment() {
        let err = Requirement::parse("numpy  # scientific").unwrap_err();
        assert!(err.message.contains("Expected end or semicolon"));
    }

    #[test]
    fn rejects_pip_options() {
        assert!(Requirement::parse("-r other.txt").is_err());
        assert!(Requirement::parse("-e .").is_err());
        assert!(Requirement::parse("--index-url https://example.com").is_err());
    }

    #[test]
    fn rejects_operator_without_version() {
        let err = Requirement::parse("numpy==").unwrap_err();
        assert_eq!(err.position, 7);
        assert!(err.message.contains("Expected version"));
    }

    #[test]
    fn rejects_unknown_marker_variable() {
        assert!(Requirement::parse("pkg; colour == 'red'").is_err());
    }

    #[test]
    fn rejects_unclosed_extras() {
        assert!(Requirement::parse("pkg[one").is_err());
    }

    #[test]
    fn rejects_name_ending_in_separator() {
        assert!(Requirement::parse("pkg-").is_err());
    }

    #[test]
    fn from_str_matches_parse() {
        let a: Requirement = "attrs>=23".parse().unwrap();
        assert_eq!(a, Requirement::parse("attrs>=23").unwrap());
    }

    #[test]
    fn error_display_includes_position() {
        let err = Requirement::parse("numpy!").unwrap_err();
        assert!(err.to_string().contains("at position 5"));
    }
}
