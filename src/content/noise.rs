//! Heuristic signatures of non-content markup

use scraper::node::Element;

/// Elements removed outright, with their whole subtree
const REMOVED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "object", "embed", "iframe", "applet", "svg",
    "canvas", "nav", "footer", "aside",
];

/// ARIA landmark roles that mark page chrome
const NOISE_ROLES: &[&str] = &["navigation", "contentinfo", "complementary"];

/// Class/id fragments that mark page chrome anywhere in the value
const NOISE_SUBSTRINGS: &[&str] = &[
    "footer",
    "sidebar",
    "navbar",
    "navigation",
    "breadcrumb",
    "advert",
    "sponsor",
    "cookie",
    "consent",
    "share",
    "social",
    "popup",
];

/// Class/id tokens that only count as noise when they stand alone
/// (so "ad" matches `ad-slot` but not `header` or `download`)
const NOISE_TOKENS: &[&str] = &["nav", "ad", "ads", "menu"];

/// Elements that count as content even without text
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "source"];

/// Returns true if the element and its subtree should be dropped
pub fn is_noise(element: &Element) -> bool {
    if REMOVED_TAGS.contains(&element.name()) {
        return true;
    }

    if element
        .attr("aria-hidden")
        .map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }

    if element.attr("role").map_or(false, |role| {
        let role = role.trim().to_ascii_lowercase();
        NOISE_ROLES.contains(&role.as_str())
    }) {
        return true;
    }

    element.id().map_or(false, is_noise_identifier) || element.classes().any(is_noise_identifier)
}

/// Returns true if an element is media and therefore never "empty"
pub fn is_media(name: &str) -> bool {
    MEDIA_TAGS.contains(&name)
}

fn is_noise_identifier(value: &str) -> bool {
    let value = value.to_ascii_lowercase();

    if NOISE_SUBSTRINGS.iter().any(|needle| value.contains(needle)) {
        return true;
    }

    value
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .any(|token| NOISE_TOKENS.contains(&token))
}
