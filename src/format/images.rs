//! `<img>` preprocessing before Markdown formatting

use crate::config::ImageMode;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;
use url::Url;

/// Fallback file name for images whose source has no usable last segment
const DEFAULT_IMAGE_NAME: &str = "image.jpg";

fn img_pattern() -> &'static Regex {
    static IMG_PATTERN: OnceLock<Regex> = OnceLock::new();
    IMG_PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<img\s+[^>]*src="([^"]+)"[^>]*>"#).expect("Invalid img regex")
    })
}

/// Applies the configured image treatment to an HTML blob
pub fn prepare_images(html: &str, mode: ImageMode) -> Cow<'_, str> {
    match mode {
        ImageMode::Keep => Cow::Borrowed(html),
        ImageMode::LocalNames => rewrite_to_local_names(html),
        ImageMode::Describe => replace_with_descriptions(html),
    }
}

/// Points every image at a local file named after its source's last segment
pub fn rewrite_to_local_names(html: &str) -> Cow<'_, str> {
    img_pattern().replace_all(html, |caps: &Captures| {
        format!(r#"<img src="{}" alt="Image"/>"#, local_image_name(&caps[1]))
    })
}

/// Replaces every image with a textual placeholder naming its source
pub fn replace_with_descriptions(html: &str) -> Cow<'_, str> {
    img_pattern().replace_all(html, |caps: &Captures| {
        format!(
            r#"<div class="image-description">[Image description for: {}]</div>"#,
            &caps[1]
        )
    })
}

/// Last path segment of an image source, or a default name
pub fn local_image_name(src: &str) -> String {
    let path = match Url::parse(src) {
        Ok(url) => url.path().to_string(),
        // Relative sources: drop any query or fragment by hand
        Err(_) => src.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(DEFAULT_IMAGE_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_image_name() {
        assert_eq!(local_image_name("https://cdn.test/a/b/photo.png?w=200"), "photo.png");
        assert_eq!(local_image_name("/static/logo.svg#x"), "logo.svg");
        assert_eq!(local_image_name("https://cdn.test/"), "image.jpg");
        assert_eq!(local_image_name("pic.gif"), "pic.gif");
    }

    #[test]
    fn test_keep_is_untouched() {
        let html = r#"<p><img src="a.png" alt="A"></p>"#;
        assert!(matches!(prepare_images(html, ImageMode::Keep), Cow::Borrowed(_)));
    }

    #[test]
    fn test_local_names() {
        let html = r#"<p><img src="https://cdn.test/x/cat.jpg" alt="Cat" width="10"> and <IMG alt="d" src="/dog.png"></p>"#;
        assert_eq!(
            prepare_images(html, ImageMode::LocalNames),
            r#"<p><img src="cat.jpg" alt="Image"/> and <img src="dog.png" alt="Image"/></p>"#
        );
    }

    #[test]
    fn test_describe() {
        let html = r#"<img src="https://cdn.test/cat.jpg">"#;
        assert_eq!(
            prepare_images(html, ImageMode::Describe),
            r#"<div class="image-description">[Image description for: https://cdn.test/cat.jpg]</div>"#
        );
    }

    #[test]
    fn test_no_images() {
        let html = "<p>text only</p>";
        assert_eq!(prepare_images(html, ImageMode::Describe), html);
    }
}
