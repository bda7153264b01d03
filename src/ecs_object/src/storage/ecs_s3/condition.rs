//! Write preconditions.
//!
//! Conditions are evaluated by the service, never locally. All present
//! conditions must hold for the write to proceed; a violated condition comes
//! back as [`ObjectError::PreconditionFailed`](super::error::ObjectError::PreconditionFailed).
//!
//! | Condition | Header | Holds when |
//! |-----------|--------|------------|
//! | `unmodified_since` | `If-Unmodified-Since` | object not modified after the instant |
//! | `modified_since` | `If-Modified-Since` | object modified after the instant |
//! | `if_match` | `If-Match` | ETag equals / `Any`: object exists |
//! | `if_none_match` | `If-None-Match` | ETag differs / `Any`: object does not exist |

use std::fmt;
use std::time::SystemTime;

use typed_builder::TypedBuilder;

/// Entity tag of an object.
///
/// The opaque value is stored without quotes; a weak tag (`W/"..."`) keeps
/// its weakness so it is sent back exactly as the service issued it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ETag {
    value: String,
    weak: bool,
}

impl ETag {
    /// Create an ETag from a raw value, quoted or not, strong or weak.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        let (weak, tag) = match trimmed.strip_prefix("W/") {
            Some(tag) => (true, tag),
            None => (false, trimmed),
        };
        let unquoted = tag
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(tag);
        ETag {
            value: unquoted.to_string(),
            weak,
        }
    }

    /// The opaque tag, without quotes or weakness marker.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// Strong comparison: both tags strong and identical.
    pub fn strong_eq(&self, other: &ETag) -> bool {
        !self.weak && !other.weak && self.value == other.value
    }

    /// Weak comparison: identical opaque tags, weakness ignored.
    pub fn weak_eq(&self, other: &ETag) -> bool {
        self.value == other.value
    }

    /// Form used in headers: `"tag"` or `W/"tag"`.
    pub fn header_value(&self) -> String {
        if self.weak {
            format!("W/\"{}\"", self.value)
        } else {
            format!("\"{}\"", self.value)
        }
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

impl From<&str> for ETag {
    fn from(value: &str) -> Self {
        ETag::new(value)
    }
}

impl From<String> for ETag {
    fn from(value: String) -> Self {
        ETag::new(value)
    }
}

/// Operand of `If-Match` / `If-None-Match`.
///
/// `Any` is the `*` wildcard. An `Exact` tag is always sent quoted, so a tag
/// whose value happens to be `*` is never mistaken for the wildcard.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ETagCondition {
    Any,
    Exact(ETag),
}

impl ETagCondition {
    pub fn exact(etag: impl Into<ETag>) -> Self {
        ETagCondition::Exact(etag.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ETagCondition::Any)
    }

    pub fn header_value(&self) -> String {
        match self {
            ETagCondition::Any => "*".to_string(),
            ETagCondition::Exact(etag) => etag.header_value(),
        }
    }

    /// Parse a header value; a bare `*` is the wildcard.
    pub fn from_header_value(value: &str) -> Self {
        if value.trim() == "*" {
            ETagCondition::Any
        } else {
            ETagCondition::Exact(ETag::new(value))
        }
    }
}

/// Preconditions attached to a write.
///
/// # Example
///
/// ```rust,ignore
/// let conditions = WriteConditions::builder()
///     .if_match(ETagCondition::exact(outcome.etag.clone()))
///     .build();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, TypedBuilder)]
pub struct WriteConditions {
    /// Proceed only if the object was not modified after this instant.
    #[builder(default, setter(strip_option))]
    pub unmodified_since: Option<SystemTime>,

    /// Proceed only if the object was modified after this instant.
    #[builder(default, setter(strip_option))]
    pub modified_since: Option<SystemTime>,

    /// Proceed only if the current ETag matches.
    #[builder(default, setter(strip_option))]
    pub if_match: Option<ETagCondition>,

    /// Proceed only if the current ETag does not match.
    #[builder(default, setter(strip_option))]
    pub if_none_match: Option<ETagCondition>,
}

impl WriteConditions {
    pub fn is_empty(&self) -> bool {
        self.unmodified_since.is_none()
            && self.modified_since.is_none()
            && self.if_match.is_none()
            && self.if_none_match.is_none()
    }

    /// Whether resending the same conditions after a lost response is harmless.
    ///
    /// A specific ETag goes stale once the first attempt lands, so the
    /// current ETag has to be re-read before retrying.
    pub fn is_safe_to_retry(&self) -> bool {
        let exact = |c: &Option<ETagCondition>| matches!(c, Some(ETagCondition::Exact(_)));
        !exact(&self.if_match) && !exact(&self.if_none_match)
    }

    /// Header name/value pairs, in a fixed order.
    pub(crate) fn header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(at) = self.unmodified_since {
            pairs.push(("if-unmodified-since", httpdate::fmt_http_date(at)));
        }
        if let Some(at) = self.modified_since {
            pairs.push(("if-modified-since", httpdate::fmt_http_date(at)));
        }
        if let Some(cond) = &self.if_match {
            pairs.push(("if-match", cond.header_value()));
        }
        if let Some(cond) = &self.if_none_match {
            pairs.push(("if-none-match", cond.header_value()));
        }
        pairs
    }
}
