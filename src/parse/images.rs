use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

pub const DEFAULT_IMAGE_LIMIT: usize = 24;
const IMAGE_WALK_MAX_DEPTH: usize = 8;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".heic", ".avif",
];

/// Keys that usually hold listing photos, matched case-insensitively.
const IMAGE_KEYS: &[&str] = &[
    "images",
    "image",
    "image_url",
    "image_urls",
    "imageurl",
    "imageurls",
    "img",
    "imgs",
    "img_url",
    "img_urls",
    "imgurl",
    "imgurllist",
    "photo",
    "photos",
    "photo_list",
    "pictures",
    "thumbnail",
    "thumbnails",
    "thumb",
    "gallery",
    "images_thumbnail",
    "repimgurl",
];

const TEXT_KEYS: &[&str] = &["description", "content", "memo", "detail", "html", "body"];

fn url_in_text_re() -> &'static Regex {
    static URL_IN_TEXT_RE: OnceLock<Regex> = OnceLock::new();
    URL_IN_TEXT_RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:https?:)?//[^\s"'<>()\[\]]+"#).expect("valid url-in-text regex")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCollection {
    pub urls: Vec<String>,
    /// URL-like strings under image keys that failed validation.
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImageCollector<'a> {
    limit: usize,
    base: Option<&'a Url>,
    extra_keys: Vec<String>,
    text_keys: Vec<String>,
    nested_listing_keys: Vec<String>,
}

impl<'a> ImageCollector<'a> {
    pub fn new(limit: usize, base: Option<&'a Url>) -> Self {
        Self {
            limit,
            base,
            extra_keys: Vec::new(),
            text_keys: TEXT_KEYS.iter().map(|k| (*k).to_owned()).collect(),
            nested_listing_keys: Vec::new(),
        }
    }

    pub fn with_image_keys<'k>(mut self, keys: impl IntoIterator<Item = &'k str>) -> Self {
        for key in keys {
            let last = key.rsplit('.').next().unwrap_or(key).to_lowercase();
            if !self.extra_keys.contains(&last) {
                self.extra_keys.push(last);
            }
        }
        self
    }

    pub fn with_text_keys<'k>(mut self, keys: impl IntoIterator<Item = &'k str>) -> Self {
        for key in keys {
            let lower = key.to_lowercase();
            if !self.text_keys.contains(&lower) {
                self.text_keys.push(lower);
            }
        }
        self
    }

    /// Nested objects owning any of these keys are other listings; their
    /// images and text are never collected for the outer candidate.
    pub fn with_nested_listing_keys<'k>(
        mut self,
        keys: impl IntoIterator<Item = &'k str>,
    ) -> Self {
        self.nested_listing_keys.extend(keys.into_iter().map(str::to_owned));
        self
    }

    fn is_nested_listing(&self, value: &Value) -> bool {
        let owns_key = |item: &Value| match item {
            Value::Object(map) => map.keys().any(|key| self.nested_listing_keys.contains(key)),
            _ => false,
        };
        match value {
            Value::Array(items) => items.iter().any(owns_key),
            other => owns_key(other),
        }
    }

    fn descends(&self, value: &Value) -> bool {
        !self.is_nested_listing(value)
    }

    fn is_image_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        IMAGE_KEYS.contains(&lower.as_str()) || self.extra_keys.contains(&lower)
    }

    fn is_text_key(&self, key: &str) -> bool {
        self.text_keys.contains(&key.to_lowercase())
    }

    pub fn collect(&self, candidate: &Value) -> ImageCollection {
        let mut out = Accumulator::new(self.limit);

        // image-ish keys first
        for subtree in self.image_subtrees(candidate) {
            for raw in strings_in(subtree, &|_: &Value| true) {
                if !looks_like_url(raw) {
                    continue;
                }
                match normalize_image_url(raw, self.base) {
                    Some(url) => out.push(url),
                    None => out.reject(raw),
                }
            }
        }

        // whole tree, only when image keys gave nothing
        if out.urls.is_empty() {
            for raw in strings_in(candidate, &|value: &Value| self.descends(value)) {
                if looks_like_url(raw)
                    && let Some(url) = normalize_image_url(raw, self.base)
                {
                    out.push(url);
                }
            }
        }

        for text in self.text_fields(candidate) {
            for found in url_in_text_re().find_iter(text) {
                if let Some(url) = normalize_image_url(found.as_str(), self.base) {
                    out.push(url);
                }
            }
        }

        out.finish()
    }

    fn image_subtrees<'v>(&self, root: &'v Value) -> Vec<&'v Value> {
        let mut found = Vec::new();
        walk_entries(root, &mut |key, value| {
            if self.is_image_key(key) {
                found.push(value);
                false
            } else {
                self.descends(value)
            }
        });
        found
    }

    fn text_fields<'v>(&self, root: &'v Value) -> Vec<&'v str> {
        let mut found = Vec::new();
        walk_entries(root, &mut |key, value| {
            if self.is_text_key(key)
                && let Value::String(text) = value
            {
                found.push(text.as_str());
            }
            self.descends(value)
        });
        found
    }
}

struct Accumulator {
    limit: usize,
    seen: HashSet<String>,
    urls: Vec<String>,
    rejected: Vec<String>,
}

impl Accumulator {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            urls: Vec::new(),
            rejected: Vec::new(),
        }
    }

    fn push(&mut self, url: String) {
        if self.urls.len() >= self.limit {
            return;
        }
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }

    fn reject(&mut self, raw: &str) {
        let raw = raw.trim().to_owned();
        if !self.rejected.contains(&raw) {
            self.rejected.push(raw);
        }
    }

    fn finish(self) -> ImageCollection {
        ImageCollection {
            urls: self.urls,
            rejected: self.rejected,
        }
    }
}

/// Visit `(key, value)` object entries depth-first, bounded by depth.
/// The visitor returns whether to descend into `value`.
fn walk_entries<'v>(root: &'v Value, visit: &mut dyn FnMut(&str, &'v Value) -> bool) {
    let mut stack: Vec<(&'v Value, usize)> = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        if depth > IMAGE_WALK_MAX_DEPTH {
            continue;
        }
        match node {
            Value::Object(map) => {
                for (key, value) in map.iter().rev() {
                    if visit(key, value) {
                        stack.push((value, depth + 1));
                    }
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev() {
                    stack.push((item, depth + 1));
                }
            }
            _ => {}
        }
    }
}

/// Every string leaf under `root`, in document order, bounded by depth.
/// Containers for which `descend` is false are skipped.
fn strings_in<'v>(root: &'v Value, descend: &dyn Fn(&Value) -> bool) -> Vec<&'v str> {
    let mut out = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        if depth > IMAGE_WALK_MAX_DEPTH {
            continue;
        }
        match node {
            Value::String(s) => out.push(s.as_str()),
            Value::Object(map) => {
                for value in map.values().rev().filter(|v| descend(v)) {
                    stack.push((value, depth + 1));
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev().filter(|v| descend(v)) {
                    stack.push((item, depth + 1));
                }
            }
            _ => {}
        }
    }
    out
}

fn looks_like_url(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty()
        && !trimmed.contains(char::is_whitespace)
        && (trimmed.contains("://") || trimmed.starts_with('/') || trimmed.contains('.'))
}

/// Normalize one URL and keep it only when it is an http(s) image URL.
///
/// Protocol-relative URLs become https; relative paths are joined against `base`.
pub fn normalize_image_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_end_matches([',', ';', '.'])
        .replace("\\/", "/")
        .replace("&amp;", "&");
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }

    let parsed = if let Some(rest) = trimmed.strip_prefix("//") {
        Url::parse(&format!("https://{rest}")).ok()?
    } else if trimmed.contains("://") {
        Url::parse(&trimmed).ok()?
    } else {
        base?.join(&trimmed).ok()?
    };

    is_valid_image_url(&parsed).then(|| parsed.to_string())
}

pub fn is_valid_image_url(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    if url.host_str().is_none() {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
