/// Whether a URL, judged purely by its path extension, names a page (HTML)
/// or a non-HTML asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Page,
    Asset,
}

const ASSET_EXTENSIONS: &[&str] = &[
    // styles / scripts
    "css", "js", "map",
    // data
    "json", "xml",
    // images
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp",
    // fonts
    "woff", "woff2", "ttf", "eot", "otf",
    // media
    "mp3", "mp4", "webm", "ogg", "wav",
    // archives / documents
    "pdf", "zip", "tar", "gz",
];

/// Classifies a URL by the extension of its last path segment.
#[must_use]
pub fn is_asset(url: &url::Url) -> bool {
    classify(url) == Classification::Asset
}

#[must_use]
pub fn classify(url: &url::Url) -> Classification {
    let Some(segment) = url.path_segments().and_then(std::iter::Iterator::last) else {
        return Classification::Page;
    };
    match segment.rsplit_once('.') {
        Some((_, ext)) if ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            Classification::Asset
        }
        _ => Classification::Page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn classifies_known_assets() {
        for s in [
            "https://e.com/app.css",
            "https://e.com/a/b/img.PNG",
            "https://e.com/font.woff2",
            "https://e.com/data.json",
            "https://e.com/archive.pdf",
        ] {
            assert_eq!(classify(&u(s)), Classification::Asset, "{s}");
        }
    }

    #[test]
    fn classifies_pages() {
        for s in [
            "https://e.com/",
            "https://e.com/about",
            "https://e.com/index.html",
            "https://e.com/blog/post",
        ] {
            assert_eq!(classify(&u(s)), Classification::Page, "{s}");
        }
    }

    #[test]
    fn extensions_outside_the_enumerated_set_are_pages() {
        for s in [
            "https://e.com/clip.mov",
            "https://e.com/archive.7z",
            "https://e.com/module.mjs",
            "https://e.com/photo.avif",
        ] {
            assert_eq!(classify(&u(s)), Classification::Page, "{s}");
        }
    }
}
