//! Domain scoping policy
//!
//! A [`DomainFilter`] decides which record names the provider may read or
//! write. It is built once at startup from a [`DomainFilterSpec`] and is
//! immutable afterwards.
//!
//! Two mutually exclusive modes exist:
//!
//! - **Regex**: active when the include pattern is non-empty. A name matches
//!   if it matches the include pattern and does not match the (optional)
//!   exclude pattern.
//! - **Plain lists**: a name matches if it lies within one of the include
//!   domains (or the include list is empty) and within none of the exclude
//!   domains.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::info;

/// Filter configuration, as read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFilterSpec {
    /// Domain-membership lists
    PlainLists {
        include: Vec<String>,
        exclude: Vec<String>,
    },
    /// Regular expression pair
    RegexLists {
        include_pattern: String,
        exclude_pattern: String,
    },
}

impl DomainFilterSpec {
    /// Select the filter mode from the four configuration values
    ///
    /// The regex pair takes precedence whenever its include pattern is set.
    pub fn from_parts(
        include: Vec<String>,
        exclude: Vec<String>,
        include_pattern: impl Into<String>,
        exclude_pattern: impl Into<String>,
    ) -> Self {
        let include_pattern = include_pattern.into();
        if include_pattern.is_empty() {
            DomainFilterSpec::PlainLists { include, exclude }
        } else {
            DomainFilterSpec::RegexLists {
                include_pattern,
                exclude_pattern: exclude_pattern.into(),
            }
        }
    }
}

impl Default for DomainFilterSpec {
    fn default() -> Self {
        DomainFilterSpec::PlainLists {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Plain {
        include: Vec<String>,
        exclude: Vec<String>,
    },
    Regex {
        include: Regex,
        exclude: Option<Regex>,
    },
}

/// Compiled domain filter
#[derive(Debug, Clone)]
pub struct DomainFilter {
    matcher: Matcher,
}

impl DomainFilter {
    /// Build a filter, logging a one-line summary of the active mode
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if either regex fails to compile.
    pub fn build(spec: &DomainFilterSpec) -> Result<Self> {
        let matcher = match spec {
            DomainFilterSpec::RegexLists {
                include_pattern,
                exclude_pattern,
            } if !include_pattern.is_empty() => Matcher::Regex {
                include: compile(include_pattern)?,
                exclude: if exclude_pattern.is_empty() {
                    None
                } else {
                    Some(compile(exclude_pattern)?)
                },
            },
            DomainFilterSpec::RegexLists { .. } => Matcher::Plain {
                include: Vec::new(),
                exclude: Vec::new(),
            },
            DomainFilterSpec::PlainLists { include, exclude } => Matcher::Plain {
                include: prepare(include),
                exclude: prepare(exclude),
            },
        };

        let filter = Self { matcher };
        info!("{}", filter.describe());
        Ok(filter)
    }

    /// A filter that lets every name through
    pub fn allow_all() -> Self {
        Self {
            matcher: Matcher::Plain {
                include: Vec::new(),
                exclude: Vec::new(),
            },
        }
    }

    /// Whether `name` is within the provider's scope
    pub fn matches(&self, name: &str) -> bool {
        let name = normalize(name);
        match &self.matcher {
            Matcher::Regex { include, exclude } => {
                include.is_match(&name) && !exclude.as_ref().is_some_and(|re| re.is_match(&name))
            }
            Matcher::Plain { include, exclude } => {
                (include.is_empty() || include.iter().any(|d| within(&name, d)))
                    && !exclude.iter().any(|d| within(&name, d))
            }
        }
    }

    /// Human-readable summary of the active mode and values
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match &self.matcher {
            Matcher::Regex { include, exclude } => {
                parts.push(format!("Regexp domain filter: '{}'", include.as_str()));
                if let Some(exclude) = exclude {
                    parts.push(format!("with exclusion: '{}'", exclude.as_str()));
                }
            }
            Matcher::Plain { include, exclude } => {
                if !include.is_empty() {
                    parts.push(format!("Domain filter: '{}'", include.join(",")));
                }
                if !exclude.is_empty() {
                    parts.push(format!("Exclude domain filter: '{}'", exclude.join(",")));
                }
            }
        }

        if parts.is_empty() {
            "Creating Unbound provider with no kind of domain filters".to_string()
        } else {
            format!("Creating Unbound provider with {}", parts.join(", "))
        }
    }
}

impl Default for DomainFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Negotiation document sent to ExternalDNS on `GET /`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DomainFilterDocument<'a> {
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    include: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    exclude: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    regex_include: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    regex_exclude: &'a str,
}

impl Serialize for DomainFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let document = match &self.matcher {
            Matcher::Regex { include, exclude } => DomainFilterDocument {
                include: &[],
                exclude: &[],
                regex_include: include.as_str(),
                regex_exclude: exclude.as_ref().map(Regex::as_str).unwrap_or_default(),
            },
            Matcher::Plain { include, exclude } => DomainFilterDocument {
                include,
                exclude,
                regex_include: "",
                regex_exclude: "",
            },
        };
        document.serialize(serializer)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Lower-case, trim, and drop a single trailing dot
fn normalize(name: &str) -> String {
    let name = name.trim();
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

fn prepare(domains: &[String]) -> Vec<String> {
    let mut prepared: Vec<String> = domains
        .iter()
        .map(|d| normalize(d))
        .filter(|d| !d.is_empty())
        .collect();
    prepared.sort();
    prepared.dedup();
    prepared
}

/// Domain membership on label boundaries; a leading dot means a raw suffix
fn within(name: &str, domain: &str) -> bool {
    if domain.starts_with('.') {
        return name.ends_with(domain);
    }
    name == domain
        || name
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
