//! Path/method rules compiled once at startup.

use axum::http::Method;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    Regex(Regex),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(literal) => literal == path,
            Self::Regex(re) => re.is_match(path),
        }
    }
}

/// One pattern plus an optional method filter.
#[derive(Debug, Clone)]
pub struct ExemptionRule {
    pattern: PathPattern,
    methods: Option<Vec<Method>>,
}

impl ExemptionRule {
    pub fn exact(path: impl Into<String>) -> Self {
        Self {
            pattern: PathPattern::Exact(path.into()),
            methods: None,
        }
    }

    pub fn regex(pattern: &str) -> Result<Self, RuleError> {
        let re = Regex::new(pattern).map_err(|e| RuleError::Regex(e.to_string()))?;
        Ok(Self {
            pattern: PathPattern::Regex(re),
            methods: None,
        })
    }

    /// Restrict the rule to `methods`. Names are case-insensitive.
    pub fn methods<I, M>(mut self, methods: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        let parsed = methods
            .into_iter()
            .map(|m| parse_method(m.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.methods = Some(parsed);
        Ok(self)
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn matches(&self, path: &str, method: &Method) -> bool {
        self.pattern.matches(path)
            && self
                .methods
                .as_ref()
                .map_or(true, |methods| methods.contains(method))
    }

    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        let rule = match (&config.path, &config.regex) {
            (Some(path), None) => Self::exact(path.clone()),
            (None, Some(pattern)) => Self::regex(pattern)?,
            (Some(_), Some(_)) => return Err(RuleError::AmbiguousPattern),
            (None, None) => return Err(RuleError::MissingPattern),
        };
        match &config.method {
            Some(MethodList::One(m)) => rule.methods([m]),
            Some(MethodList::Many(ms)) => rule.methods(ms),
            None => Ok(rule),
        }
    }
}

fn parse_method(name: &str) -> Result<Method, RuleError> {
    Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| RuleError::Method(name.to_string()))
}

/// Immutable rule set, shared read-only between guards.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    rules: Vec<ExemptionRule>,
}

impl PathMatcher {
    pub fn new(rules: Vec<ExemptionRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(configs: &[RuleConfig]) -> Result<Self, RuleError> {
        configs
            .iter()
            .map(ExemptionRule::from_config)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// True if any rule matches; stops at the first hit.
    pub fn is_exempt(&self, path: &str, method: &Method) -> bool {
        self.rules.iter().any(|rule| rule.matches(path, method))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Rule as written in configuration files.
///
/// ```toml
/// [[auth.public]]
/// path = "/api/v1/auth/login"
/// method = "POST"
///
/// [[auth.public]]
/// regex = "^/api/v1/docs"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub method: Option<MethodList>,
}

impl RuleConfig {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            regex: Some(pattern.into()),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(MethodList::One(method.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MethodList {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    MissingPattern,
    AmbiguousPattern,
    Regex(String),
    Method(String),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPattern => write!(f, "rule needs either `path` or `regex`"),
            Self::AmbiguousPattern => write!(f, "rule sets both `path` and `regex`"),
            Self::Regex(e) => write!(f, "invalid regex: {}", e),
            Self::Method(m) => write!(f, "invalid HTTP method: {:?}", m),
        }
    }
}

impl std::error::Error for RuleError {}
