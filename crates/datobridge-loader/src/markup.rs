//! Markup fragments for document heads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One `<head>` element: tag name, optional text content and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    pub tag_name: String,
    pub content: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl MetaTag {
    /// An empty element.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            content: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the text content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// `<meta name="..." content="...">`
    pub fn meta_name(name: &str, content: impl Into<String>) -> Self {
        Self::new("meta")
            .with_attr("name", name)
            .with_attr("content", content)
    }

    /// `<meta property="..." content="...">`
    pub fn meta_property(property: &str, content: impl Into<String>) -> Self {
        Self::new("meta")
            .with_attr("property", property)
            .with_attr("content", content)
    }

    /// `<link rel="..." href="...">`
    pub fn link(rel: &str, href: impl Into<String>) -> Self {
        Self::new("link").with_attr("rel", rel).with_attr("href", href)
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Render as HTML. Elements without content use the void form.
    #[must_use]
    pub fn to_html(&self) -> String {
        let attrs: String = self
            .attributes
            .iter()
            .map(|(k, v)| format!(r#" {}="{}""#, k, html_escape(v)))
            .collect();

        match &self.content {
            Some(content) => format!(
                "<{tag}{attrs}>{}</{tag}>",
                html_escape(content),
                tag = self.tag_name
            ),
            None => format!("<{}{attrs} />", self.tag_name),
        }
    }
}

/// Render a list of tags back to back.
#[must_use]
pub fn render_tags(tags: &[MetaTag]) -> String {
    tags.iter().map(MetaTag::to_html).collect()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
