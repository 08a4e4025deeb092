//! Favicon and app icon tags derived from the site's favicon image.

use datobridge_core::{Image, SiteMetadata};

use crate::markup::MetaTag;

const APPLE_TOUCH_SIZES: [u32; 9] = [57, 60, 72, 76, 114, 120, 144, 152, 180];
const ICON_SIZES: [u32; 4] = [16, 32, 96, 192];
const MS_SQUARE_SIZES: [u32; 3] = [70, 150, 310];

/// Builds icon links, app name and theme color tags for a site.
#[derive(Debug)]
pub struct FaviconTagsBuilder<'a> {
    site: &'a SiteMetadata,
    theme_color: Option<&'a str>,
}

/// Append resize parameters to an image URL.
fn resized(url: &str, width: u32, height: u32) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}w={width}&h={height}")
}

impl<'a> FaviconTagsBuilder<'a> {
    #[must_use]
    pub fn new(site: &'a SiteMetadata, theme_color: Option<&'a str>) -> Self {
        Self { site, theme_color }
    }

    /// All tags. Icon links are skipped when the site has no favicon.
    #[must_use]
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        let mut tags = Vec::new();

        if let Some(favicon) = self.site.favicon.as_ref().filter(|f| !f.url.is_empty()) {
            tags.extend(Self::icon_tags(favicon));
        }
        if let Some(name) = self.site.name.as_deref().filter(|n| !n.trim().is_empty()) {
            tags.push(MetaTag::meta_name("application-name", name));
        }
        if let Some(color) = self.theme_color.filter(|c| !c.trim().is_empty()) {
            tags.push(MetaTag::meta_name("theme-color", color));
            tags.push(MetaTag::meta_name("msapplication-TileColor", color));
        }

        tags
    }

    fn icon_tags(favicon: &Image) -> Vec<MetaTag> {
        let url = favicon.url.as_str();
        let format = favicon.format.as_deref().unwrap_or("png");
        let mut tags = Vec::new();

        for size in APPLE_TOUCH_SIZES {
            tags.push(
                MetaTag::link("apple-touch-icon", resized(url, size, size))
                    .with_attr("sizes", format!("{size}x{size}")),
            );
        }

        for size in ICON_SIZES {
            tags.push(
                MetaTag::link("icon", resized(url, size, size))
                    .with_attr("sizes", format!("{size}x{size}"))
                    .with_attr("type", format!("image/{format}")),
            );
        }

        for size in MS_SQUARE_SIZES {
            tags.push(MetaTag::meta_name(
                &format!("msapplication-square{size}x{size}logo"),
                resized(url, size, size),
            ));
        }
        tags.push(MetaTag::meta_name(
            "msapplication-wide310x150logo",
            resized(url, 310, 150),
        ));

        tags
    }
}
