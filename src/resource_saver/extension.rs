/// Maps a MIME primary type to its canonical file extension, when one is
/// unambiguous enough to fix up a saved file's name.
fn mime_extension(mime: &str) -> Option<&'static str> {
    let primary = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
    Some(match primary.as_str() {
        "text/html" => "html",
        "text/css" => "css",
        "application/javascript" | "text/javascript" | "application/x-javascript" => "js",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/bmp" => "bmp",
        "image/avif" => "avif",
        "font/woff" | "application/font-woff" => "woff",
        "font/woff2" => "woff2",
        "font/ttf" | "application/x-font-ttf" => "ttf",
        "application/vnd.ms-fontobject" => "eot",
        "font/otf" => "otf",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        _ => return None,
    })
}

fn equivalence_group(ext: &str) -> &'static [&'static str] {
    match ext {
        "jpg" | "jpeg" => &["jpg", "jpeg"],
        "htm" | "html" => &["htm", "html"],
        "js" | "mjs" | "cjs" => &["js", "mjs", "cjs"],
        _ => &[],
    }
}

fn is_known_extension(ext: &str) -> bool {
    const KNOWN: &[&str] = &[
        "html", "htm", "css", "js", "mjs", "cjs", "json", "xml", "png", "jpg", "jpeg", "gif",
        "webp", "svg", "ico", "bmp", "avif", "woff", "woff2", "ttf", "eot", "otf", "mp3", "mp4",
        "webm", "ogg", "wav", "pdf", "zip", "tar", "gz",
    ];
    KNOWN.contains(&ext)
}

/// Splices `insert` between a path's stem and its final extension.
pub(super) fn splice_before_extension(path: &str, insert: &str) -> String {
    match path.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}{insert}.{ext}"),
        None => format!("{path}{insert}"),
    }
}

/// Reconciles a candidate path's extension with the resource's MIME type
/// (SPEC_FULL §4.4 step 2). A recognized extension that already agrees with
/// the MIME (directly or via an equivalence group) is left untouched; an
/// unrecognized extension gets the MIME-derived one appended.
pub(super) fn fix_extension(candidate: &str, mime: &str) -> String {
    let Some(mime_ext) = mime_extension(mime) else {
        return candidate.to_string();
    };

    let current_ext = candidate.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());

    match current_ext {
        None => format!("{candidate}.{mime_ext}"),
        Some(ext) if equivalence_group(&ext).contains(&mime_ext) => candidate.to_string(),
        Some(ext) if is_known_extension(&ext) => candidate.to_string(),
        Some(_) => format!("{candidate}.{mime_ext}"),
    }
}
