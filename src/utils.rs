//! Helpers for naming fetched NZB documents

use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};

/// Name used when neither the response, the URL nor the title yield one
pub const FALLBACK_FILE_NAME: &str = "nzb-health";

/// Derive a file name for a fetched NZB
///
/// Sources are tried in order:
/// 1. `filename=` or RFC 5987 `filename*=` from the Content-Disposition header
/// 2. The last path segment of `url`
/// 3. `title`, with spaces turned into dots and anything outside
///    `[A-Za-z0-9._-]` dropped
/// 4. [`FALLBACK_FILE_NAME`]
///
/// The result always ends in `.nzb` (compared case-insensitively).
///
/// # Examples
///
/// ```
/// use nzb_health::utils::nzb_file_name;
/// use reqwest::header::HeaderMap;
///
/// let name = nzb_file_name(&HeaderMap::new(), "https://indexer.example/get/", "My Show S01E01");
/// assert_eq!(name, "My.Show.S01E01.nzb");
/// ```
pub fn nzb_file_name(headers: &HeaderMap, url: &str, title: &str) -> String {
    if let Some(name) = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(file_name_from_content_disposition)
    {
        return ensure_nzb_extension(name);
    }

    if let Ok(parsed_url) = url::Url::parse(url)
        && let Some(mut segments) = parsed_url.path_segments()
        && let Some(last_segment) = segments.next_back()
        && !last_segment.is_empty()
    {
        let decoded = urlencoding::decode(last_segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| last_segment.to_string());
        return ensure_nzb_extension(decoded);
    }

    let safe = sanitize_title(title);
    if !safe.is_empty() {
        return ensure_nzb_extension(safe);
    }

    ensure_nzb_extension(FALLBACK_FILE_NAME.to_string())
}

/// Extract the file name from a Content-Disposition header value
///
/// Format: `attachment; filename="file.nzb"` or `filename*=UTF-8''file.nzb`
fn file_name_from_content_disposition(value: &str) -> Option<String> {
    for part in value.split(';') {
        let part = part.trim();
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };

        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
            "filename*" => {
                // charset'lang'encoded-filename
                if let Some(idx) = raw.rfind('\'')
                    && let Ok(decoded) = urlencoding::decode(&raw[idx + 1..])
                    && !decoded.is_empty()
                {
                    return Some(decoded.into_owned());
                }
            }
            _ => {}
        }
    }
    None
}

fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('.'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect()
}

fn ensure_nzb_extension(name: String) -> String {
    if name.to_ascii_lowercase().ends_with(".nzb") {
        name
    } else {
        format!("{name}.nzb")
    }
}
