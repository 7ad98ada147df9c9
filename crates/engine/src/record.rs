//! Starter records – the rows the showcase query engine selects from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One `(name, version_spec)` pair from a starter's package manifest.
///
/// Serialized as a two-element array, e.g. `["gatsby", "^2.0.0"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency(pub String, pub String);

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self(name.into(), version.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn version(&self) -> &str {
        &self.1
    }
}

/// A single entry in the showcase.
///
/// `tags` and `dependencies` are optional: a record without them still
/// shows up in unfiltered listings but never satisfies a facet selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
    /// Overrides the text derived from the metadata fields above.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_text: Option<String>,
    #[serde(default)]
    pub stars: u64,
    pub updated_at: DateTime<Utc>,
}

impl StarterRecord {
    pub fn new(id: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: None,
            owner: None,
            description: None,
            repository: None,
            demo: None,
            tags: None,
            dependencies: None,
            searchable_text: None,
            stars: 0,
            updated_at,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dependencies<I, N, V>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        self.dependencies = Some(
            deps.into_iter()
                .map(|(name, version)| Dependency::new(name, version))
                .collect(),
        );
        self
    }

    pub fn with_stars(mut self, stars: u64) -> Self {
        self.stars = stars;
        self
    }

    pub fn with_searchable_text(mut self, text: impl Into<String>) -> Self {
        self.searchable_text = Some(text.into());
        self
    }

    /// Text matched by free-text search, not yet case-folded.
    ///
    /// Returns the explicit `searchable_text` when present, otherwise every
    /// textual field joined by newlines.
    pub fn search_text(&self) -> Cow<'_, str> {
        if let Some(text) = &self.searchable_text {
            return Cow::Borrowed(text.as_str());
        }

        let mut parts: Vec<&str> = vec![self.id.as_str()];
        for field in [
            &self.name,
            &self.owner,
            &self.description,
            &self.repository,
            &self.demo,
        ]
        .into_iter()
        .flatten()
        {
            parts.push(field.as_str());
        }
        if let Some(tags) = &self.tags {
            parts.extend(tags.iter().map(String::as_str));
        }
        if let Some(deps) = &self.dependencies {
            for dep in deps {
                parts.push(dep.name());
                parts.push(dep.version());
            }
        }
        Cow::Owned(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_explicit_searchable_text_wins() {
        let r = StarterRecord::new("a", ts())
            .with_name("ignored")
            .with_searchable_text("React Starter");
        assert_eq!(r.search_text(), "React Starter");
    }

    #[test]
    fn test_derived_search_text_covers_metadata() {
        let r = StarterRecord::new("gatsby-starter-blog", ts())
            .with_name("Blog")
            .with_description("A minimal blog")
            .with_tags(["blog"])
            .with_dependencies([("gatsby-plugin-sharp", "^2.0.1")]);
        let text = r.search_text();
        for needle in [
            "gatsby-starter-blog",
            "Blog",
            "A minimal blog",
            "blog",
            "gatsby-plugin-sharp",
            "^2.0.1",
        ] {
            assert!(text.contains(needle), "missing {needle:?} in {text:?}");
        }
    }

    #[test]
    fn test_deserialize_dependency_pairs() {
        let json = r#"{
            "id": "starter",
            "dependencies": [["gatsby", "^2.0.0"], ["react", "16.4.0"]],
            "stars": 12,
            "updated_at": "2024-03-01T12:00:00Z"
        }"#;
        let r: StarterRecord = serde_json::from_str(json).unwrap();
        let deps = r.dependencies.unwrap();
        assert_eq!(deps[0].name(), "gatsby");
        assert_eq!(deps[1].version(), "16.4.0");
        assert!(r.tags.is_none());
        assert_eq!(r.updated_at, ts());
    }
}
