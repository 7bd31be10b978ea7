//! Module and source addressing.
//!
//! The compiler core treats a module as an opaque, ordered set of sources
//! addressable by a logical URI of the form `<scheme>:///<path>`. Discovery
//! of modules on disk or in a package registry happens outside this crate;
//! the only implementations provided here are the in-memory
//! [`StaticModule`] and [`StaticSource`], which back tests and embedders
//! that already hold the source text.

use std::{fmt, io, sync::Arc};

/// A hierarchical module address such as `testing:///pkg/main.cairn`.
///
/// The URI is structurally opaque: the single operation the pipeline needs
/// is [`LogicalUri::join`], which appends one path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalUri(Arc<str>);

impl LogicalUri {
    #[must_use]
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    /// Appends `/segment`, inserting the separator only when missing.
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let mut joined = String::with_capacity(self.0.len() + segment.len() + 1);
        joined.push_str(&self.0);
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment);
        Self(joined.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalUri {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

/// One readable source of a module.
pub trait Source {
    fn uri(&self) -> &LogicalUri;

    /// Reads the full contents. Called exactly once per lex.
    fn read(&self) -> io::Result<Vec<u8>>;
}

/// A resolved module: a URI plus the sources it consists of.
pub trait ResolvedModule {
    fn uri(&self) -> &LogicalUri;

    fn sources(&self) -> io::Result<Vec<&dyn Source>>;
}

/// An in-memory module used by tests and embedders.
#[derive(Debug)]
pub struct StaticModule {
    uri: LogicalUri,
    sources: Vec<StaticSource>,
}

impl StaticModule {
    #[must_use]
    pub fn new(uri: LogicalUri, sources: Vec<StaticSource>) -> Self {
        Self { uri, sources }
    }
}

impl ResolvedModule for StaticModule {
    fn uri(&self) -> &LogicalUri {
        &self.uri
    }

    fn sources(&self) -> io::Result<Vec<&dyn Source>> {
        Ok(self.sources.iter().map(|s| s as &dyn Source).collect())
    }
}

/// An in-memory source with fixed contents.
#[derive(Debug, Clone)]
pub struct StaticSource {
    uri: LogicalUri,
    contents: Vec<u8>,
}

impl StaticSource {
    #[must_use]
    pub fn new(uri: impl Into<LogicalUri>, contents: impl Into<Vec<u8>>) -> Self {
        Self { uri: uri.into(), contents: contents.into() }
    }
}

impl Source for StaticSource {
    fn uri(&self) -> &LogicalUri {
        &self.uri
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.contents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_inserts_separator() {
        let base = LogicalUri::new("pkg:///root");
        assert_eq!(base.join("sub").as_str(), "pkg:///root/sub");
    }

    #[test]
    fn join_keeps_existing_separator() {
        let base = LogicalUri::new("pkg:///root/");
        assert_eq!(base.join("sub").as_str(), "pkg:///root/sub");
    }
}
