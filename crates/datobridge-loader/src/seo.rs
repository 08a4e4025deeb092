//! SEO meta tags for a single record.
//!
//! Values are picked from the record's own `seo` field first, then its
//! regular fields, then the site's fallback SEO. Open Graph and Twitter tags
//! are only emitted when the site has global SEO settings.

use chrono::SecondsFormat;
use datobridge_core::{ContentItem, GlobalSeo, Image, SeoSettings, SiteMetadata};

use crate::markup::MetaTag;

/// Titles longer than this do not get the site suffix.
pub const TITLE_MAX_LENGTH: usize = 60;

/// Builds the head tags describing one record.
#[derive(Debug)]
pub struct SeoTagsBuilder<'a> {
    item: &'a ContentItem,
    site: &'a SiteMetadata,
    seo: Option<SeoSettings>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

impl<'a> SeoTagsBuilder<'a> {
    /// Builder for `item` within `site`.
    #[must_use]
    pub fn new(item: &'a ContentItem, site: &'a SiteMetadata) -> Self {
        Self {
            item,
            site,
            seo: item.seo(),
        }
    }

    fn global(&self) -> Option<&GlobalSeo> {
        self.site.global_seo.as_ref()
    }

    fn fallback(&self) -> Option<&SeoSettings> {
        self.global()?.fallback_seo.as_ref()
    }

    /// Page title without suffix.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        non_blank(self.seo.as_ref().and_then(|s| s.title.as_ref()))
            .or_else(|| self.item.title().map(str::to_string))
            .or_else(|| non_blank(self.fallback().and_then(|s| s.title.as_ref())))
    }

    /// `title` plus the site suffix when the result fits.
    #[must_use]
    pub fn full_title(&self, title: &str) -> String {
        match self.global().and_then(|g| g.title_suffix.as_deref()) {
            Some(suffix) if title.chars().count() + suffix.chars().count() <= TITLE_MAX_LENGTH => {
                format!("{title}{suffix}")
            }
            _ => title.to_string(),
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<String> {
        non_blank(self.seo.as_ref().and_then(|s| s.description.as_ref()))
            .or_else(|| self.item.str_field("description").map(str::to_string))
            .or_else(|| non_blank(self.fallback().and_then(|s| s.description.as_ref())))
    }

    fn image(&self) -> Option<&Image> {
        self.seo
            .as_ref()
            .and_then(|s| s.image.as_ref())
            .or_else(|| self.fallback().and_then(|s| s.image.as_ref()))
    }

    fn twitter_card(&self) -> String {
        self.seo
            .as_ref()
            .and_then(|s| s.twitter_card.clone())
            .or_else(|| self.fallback().and_then(|s| s.twitter_card.clone()))
            .unwrap_or_else(|| "summary".to_string())
    }

    fn no_index(&self) -> bool {
        self.site.no_index || self.seo.as_ref().and_then(|s| s.no_index) == Some(true)
    }

    /// Every tag for the record, in document order.
    #[must_use]
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        let title = self.title();
        let description = self.description();
        let mut tags = Vec::new();

        if let Some(title) = &title {
            tags.push(MetaTag::new("title").with_content(self.full_title(title)));
        }
        if let Some(description) = &description {
            tags.push(MetaTag::meta_name("description", description));
        }
        if self.no_index() {
            tags.push(MetaTag::meta_name("robots", "noindex"));
        }
        if let Some(global) = self.global() {
            tags.extend(self.social_tags(global, title.as_deref(), description.as_deref()));
        }

        tags
    }

    fn social_tags(
        &self,
        global: &GlobalSeo,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Vec<MetaTag> {
        let mut tags = Vec::new();

        if let Some(title) = title {
            tags.push(MetaTag::meta_property("og:title", title));
            tags.push(MetaTag::meta_name("twitter:title", title));
        }
        if let Some(description) = description {
            tags.push(MetaTag::meta_property("og:description", description));
            tags.push(MetaTag::meta_name("twitter:description", description));
        }

        tags.push(MetaTag::meta_property("og:type", "article"));

        if let Some(site_name) = &global.site_name {
            tags.push(MetaTag::meta_property("og:site_name", site_name));
        }
        if let Some(locale) = self.site.locales.first() {
            tags.push(MetaTag::meta_property("og:locale", locale.replace('-', "_")));
        }
        if let Some(updated_at) = self.item.meta.updated_at {
            tags.push(MetaTag::meta_property(
                "article:modified_time",
                updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        if let Some(publisher) = &global.facebook_page_url {
            tags.push(MetaTag::meta_property("article:publisher", publisher));
        }
        if let Some(account) = &global.twitter_account {
            tags.push(MetaTag::meta_name("twitter:site", account));
        }

        tags.push(MetaTag::meta_name("twitter:card", self.twitter_card()));

        if let Some(image) = self.image() {
            tags.push(MetaTag::meta_property("og:image", &image.url));
            if let Some(width) = image.width {
                tags.push(MetaTag::meta_property("og:image:width", width.to_string()));
            }
            if let Some(height) = image.height {
                tags.push(MetaTag::meta_property("og:image:height", height.to_string()));
            }
            tags.push(MetaTag::meta_name("twitter:image", &image.url));
        }

        tags
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::markup::render_tags;

    fn global_site() -> SiteMetadata {
        SiteMetadata {
            locales: vec!["en-US".to_string()],
            global_seo: Some(GlobalSeo {
                site_name: Some("Example".to_string()),
                title_suffix: Some(" | Example".to_string()),
                twitter_account: Some("@example".to_string()),
                facebook_page_url: Some("https://facebook.com/example".to_string()),
                fallback_seo: Some(SeoSettings {
                    description: Some("Fallback description".to_string()),
                    image: Some(Image {
                        url: "https://cdn.example.com/og.png".to_string(),
                        width: Some(1200),
                        height: Some(630),
                        ..Image::default()
                    }),
                    ..SeoSettings::default()
                }),
            }),
            ..SiteMetadata::default()
        }
    }

    fn find<'t>(tags: &'t [MetaTag], key: &str) -> Option<&'t MetaTag> {
        tags.iter()
            .find(|t| t.attr("property") == Some(key) || t.attr("name") == Some(key))
    }

    #[test]
    fn test_title_and_description_only() {
        let item = ContentItem::new("1", "article")
            .with_field("title", "Hello")
            .with_field("description", "World");
        let site = SiteMetadata::default();

        let tags = SeoTagsBuilder::new(&item, &site).meta_tags();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].tag_name, "title");
        assert_eq!(tags[0].content.as_deref(), Some("Hello"));
        assert!(tags[0].attributes.is_empty());
        assert_eq!(tags[1].tag_name, "meta");
        assert!(tags[1].content.is_none());
        assert_eq!(tags[1].attr("content"), Some("World"));
        assert_eq!(
            tags[1].attributes.keys().collect::<Vec<_>>(),
            vec!["content", "name"]
        );
    }

    #[test]
    fn test_seo_field_takes_precedence() {
        let item = ContentItem::new("1", "article")
            .with_field("title", "Plain title")
            .with_field(
                "seo",
                json!({ "title": "SEO title", "description": "SEO description", "no_index": true }),
            );
        let site = SiteMetadata::default();

        let tags = SeoTagsBuilder::new(&item, &site).meta_tags();
        let html = render_tags(&tags);

        assert!(html.contains("<title>SEO title</title>"));
        assert!(html.contains(r#"content="SEO description""#));
        assert!(html.contains(r#"<meta content="noindex" name="robots" />"#));
    }

    #[test]
    fn test_suffix_only_when_it_fits() {
        let site = global_site();
        let short = ContentItem::new("1", "article").with_field("title", "Short");
        let long = ContentItem::new("2", "article").with_field("title", "x".repeat(55));

        let builder = SeoTagsBuilder::new(&short, &site);
        assert_eq!(builder.full_title("Short"), "Short | Example");

        let tags = SeoTagsBuilder::new(&long, &site).meta_tags();
        assert_eq!(tags[0].content.as_deref(), Some("x".repeat(55).as_str()));
    }

    #[test]
    fn test_social_tags_with_global_seo() {
        let mut item = ContentItem::new("1", "article").with_field("title", "Hello");
        item.meta.updated_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let site = global_site();

        let tags = SeoTagsBuilder::new(&item, &site).meta_tags();

        assert_eq!(find(&tags, "og:title").and_then(|t| t.attr("content")), Some("Hello"));
        assert_eq!(
            find(&tags, "og:description").and_then(|t| t.attr("content")),
            Some("Fallback description")
        );
        assert_eq!(find(&tags, "og:locale").and_then(|t| t.attr("content")), Some("en_US"));
        assert_eq!(
            find(&tags, "article:modified_time").and_then(|t| t.attr("content")),
            Some("2024-05-01T12:00:00Z")
        );
        assert_eq!(find(&tags, "twitter:site").and_then(|t| t.attr("content")), Some("@example"));
        assert_eq!(find(&tags, "twitter:card").and_then(|t| t.attr("content")), Some("summary"));
        assert_eq!(
            find(&tags, "og:image").and_then(|t| t.attr("content")),
            Some("https://cdn.example.com/og.png")
        );
        assert_eq!(find(&tags, "og:image:width").and_then(|t| t.attr("content")), Some("1200"));
    }

    #[test]
    fn test_site_no_index() {
        let item = ContentItem::new("1", "article");
        let site = SiteMetadata {
            no_index: true,
            ..SiteMetadata::default()
        };

        let tags = SeoTagsBuilder::new(&item, &site).meta_tags();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].attr("name"), Some("robots"));
    }
}
