//! Redirect classification and script redirects
//!
//! A redirect observed on a Turbolinks request is either internal (the
//! frontend must be told about the new location on the next request) or
//! external (a normal navigation that must not carry session state).
//! Form submissions are answered with a script redirect instead of an HTTP
//! redirect so the frontend does not silently re-issue the POST.

use url::{ParseError, Url};

/// Where a redirect leads relative to the page that issued the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Same host as the referrer, or a root-relative path within this application
    Internal,
    /// Anywhere else
    External,
}

/// Policy knobs for [`classify_redirect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    /// Treat root-relative destinations (`/path`) as internal even when the
    /// referrer host does not match
    pub root_relative_internal: bool,

    /// Treat absolute destinations on another host as internal when their
    /// path is rooted (`http://backend:8080/path`), e.g. behind a proxy that
    /// rewrites the host. A bare host (`https://example.com`) stays external.
    pub cross_host_root_path_internal: bool,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            root_relative_internal: true,
            cross_host_root_path_internal: false,
        }
    }
}

/// Parsed `Location` value
#[derive(Debug)]
enum Destination {
    Absolute { url: Url, rooted: bool },
    Relative { root: bool },
}

/// Classify a redirect from `referrer` to `location`
///
/// An empty referrer (a script request without `Turbolinks-Referrer`) has no
/// host; it matches relative destinations only.
///
/// # Errors
///
/// Returns the parse error when either URL is malformed. Callers treat that
/// as "unknown" and must not stash the redirect.
///
/// # Example
///
/// ```rust
/// use acton_turbolinks::redirect::{classify_redirect, RedirectKind, RedirectPolicy};
///
/// let policy = RedirectPolicy::default();
/// let referrer = "http://localhost:3000/redirect";
///
/// assert_eq!(classify_redirect(referrer, "/", policy), Ok(RedirectKind::Internal));
/// assert_eq!(
///     classify_redirect(referrer, "https://example.com", policy),
///     Ok(RedirectKind::External)
/// );
/// ```
pub fn classify_redirect(
    referrer: &str,
    location: &str,
    policy: RedirectPolicy,
) -> Result<RedirectKind, ParseError> {
    let origin = if referrer.is_empty() {
        None
    } else {
        Some(Url::parse(referrer)?)
    };

    let destination = parse_destination(location, origin.as_ref())?;

    let kind = match destination {
        Destination::Absolute { url, rooted } => {
            if origin.as_ref().map(authority) == Some(authority(&url))
                || (rooted && policy.cross_host_root_path_internal)
            {
                RedirectKind::Internal
            } else {
                RedirectKind::External
            }
        }
        Destination::Relative { root: true } if policy.root_relative_internal => {
            RedirectKind::Internal
        }
        // A relative reference resolves against the request host, which only
        // matches an origin that has no host either.
        Destination::Relative { .. } => {
            if origin.is_none() {
                RedirectKind::Internal
            } else {
                RedirectKind::External
            }
        }
    };

    Ok(kind)
}

fn parse_destination(location: &str, origin: Option<&Url>) -> Result<Destination, ParseError> {
    match Url::parse(location) {
        Ok(url) => Ok(Destination::Absolute {
            url,
            rooted: has_rooted_path(location),
        }),
        Err(ParseError::RelativeUrlWithoutBase) => {
            if location.starts_with("//") || location.starts_with("/\\") {
                // Browsers treat both as scheme-relative references to another host
                let scheme = origin.map_or("http", Url::scheme);
                let rest = location.trim_start_matches(['/', '\\']);
                Url::parse(&format!("{scheme}://{rest}")).map(|url| Destination::Absolute {
                    url,
                    rooted: has_rooted_path(rest),
                })
            } else {
                Ok(Destination::Relative {
                    root: location.starts_with('/'),
                })
            }
        }
        Err(err) => Err(err),
    }
}

/// Whether the path of an absolute or scheme-relative reference, as written,
/// starts with a slash
///
/// Read from the raw string: `Url` normalizes the empty path of
/// `https://example.com` to `/`.
fn has_rooted_path(location: &str) -> bool {
    let rest = location
        .split_once("://")
        .map_or(location, |(_, rest)| rest);
    rest.find(['/', '\\', '?', '#'])
        .is_some_and(|i| rest[i..].starts_with(['/', '\\']))
}

fn authority(url: &Url) -> (Option<&str>, Option<u16>) {
    (url.host_str(), url.port_or_known_default())
}

/// Navigation action requested from the frontend
const VISIT_ACTION: &str = "advance";

/// Script instructing the frontend to clear its cache and visit `location`
///
/// # Example
///
/// ```rust
/// use acton_turbolinks::redirect::visit_script;
///
/// assert_eq!(
///     visit_script("/"),
///     r#"Turbolinks.clearCache();Turbolinks.visit("/", {action: "advance"});"#
/// );
/// ```
#[must_use]
pub fn visit_script(location: &str) -> String {
    format!(
        "Turbolinks.clearCache();Turbolinks.visit(\"{}\", {{action: \"{VISIT_ACTION}\"}});",
        js_escape(location)
    )
}

/// Escape `value` for embedding inside a JavaScript string literal
///
/// Quotes and backslashes are backslash-escaped; `<`, `>`, `&`, `=` and every
/// control or line/paragraph separator character become `\uXXXX`, so the
/// result can also sit inside an HTML `<script>` element.
#[must_use]
pub fn js_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '<' | '>' | '&' | '=' => push_unicode_escape(&mut escaped, c),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                push_unicode_escape(&mut escaped, c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

fn push_unicode_escape(out: &mut String, c: char) {
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{unit:04X}"));
    }
}
