//! Domain name classification.
//!
//! This module uses the Public Suffix List (PSL) to answer the questions the
//! checkers ask about a name.
//!
//! Key functions:
//! - `strip_wildcard()` - Splits a leading `*.` off a domain
//! - `public_suffix()` - The PSL suffix of a name, if the PSL knows it
//! - `registered_domain()` - The registrable domain (e.g. `example.co.uk`)
//! - `parent_domain()` - The name with its leftmost label removed

use psl::{List, Psl};

/// Splits `*.example.org` into `("example.org", true)`.
pub fn strip_wildcard(domain: &str) -> (&str, bool) {
    match domain.strip_prefix("*.") {
        Some(rest) => (rest, true),
        None => (domain, false),
    }
}

/// Returns the public suffix of `domain` when it matches an explicit PSL rule.
///
/// Names under an unlisted TLD return `None`, even though the PSL's implicit
/// `*` rule would technically match them.
pub fn public_suffix(domain: &str) -> Option<String> {
    List.suffix(domain.as_bytes())
        .filter(|suffix| suffix.is_known())
        .map(|suffix| String::from_utf8_lossy(suffix.as_bytes()).into_owned())
}

/// Returns the registrable domain of `domain`, or `None` if `domain` is
/// itself a public suffix.
pub fn registered_domain(domain: &str) -> Option<String> {
    List.domain(domain.as_bytes())
        .map(|registrable| String::from_utf8_lossy(registrable.as_bytes()).into_owned())
}

/// Removes exactly one leftmost label: `a.b.example.org` -> `b.example.org`.
pub fn parent_domain(domain: &str) -> Option<&str> {
    domain
        .split_once('.')
        .map(|(_, parent)| parent)
        .filter(|parent| !parent.is_empty())
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
