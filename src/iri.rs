//! IRI-related helpers.

use iri_string::types::{IriAbsoluteStr, IriReferenceStr, IriStr, IriString};

/// Splits the given string to prefix part and suffix part at the first colon.
pub(crate) fn to_prefix_and_suffix(s: &str) -> Option<(&str, &str)> {
    s.find(':')
        .map(|colon_pos| (&s[..colon_pos], &s[(colon_pos + 1)..]))
}

/// Checks whether the given string has the form of an absolute IRI.
///
/// Note that "absolute IRI" here follows the JSON-LD grammar: a scheme (or
/// `_`), a colon, and any run of non-whitespace characters. An IRI with a
/// fragment part is "absolute" in this sense, unlike in RFC 3987.
pub(crate) fn is_absolute_iri(s: &str) -> bool {
    let (prefix, suffix) = match to_prefix_and_suffix(s) {
        Some(v) => v,
        None => return false,
    };
    let scheme_ok = prefix == "_"
        || (prefix
            .as_bytes()
            .first()
            .map_or(false, u8::is_ascii_alphabetic)
            && prefix[1..]
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.'));
    scheme_ok && !suffix.bytes().any(|b| b.is_ascii_whitespace())
}

/// Checks whether the given string is a blank node identifier.
pub(crate) fn is_blank_node_identifier(s: &str) -> bool {
    s.starts_with("_:")
}

/// Checks whether the given string is an absolute IRI or a blank node
/// identifier.
pub(crate) fn is_absolute_or_blank_node_ident(s: &str) -> bool {
    is_blank_node_identifier(s) || is_absolute_iri(s)
}

/// Checks whether the given term has the form of a compact IRI, i.e. contains
/// a colon after its first character.
///
/// The colon of a blank node identifier or of a term such as `:suffix` does
/// not qualify.
pub(crate) fn has_compact_iri_form(s: &str) -> bool {
    s.find(':').map_or(false, |pos| pos > 0) && !s.starts_with("_:")
}

/// Checks whether the given byte is a `gen-delims` character of RFC 3986.
pub(crate) fn is_gen_delims_byte(b: u8) -> bool {
    matches!(b, b':' | b'/' | b'?' | b'#' | b'[' | b']' | b'@')
}

/// Resolves an IRI reference against the given base IRI.
///
/// The fragment part of the base (if any) is discarded before resolution, as
/// RFC 3986 section 5 requires.
pub(crate) fn resolve(reference: &str, base: &IriStr) -> anyhow::Result<IriString> {
    let reference = IriReferenceStr::new(reference)?;
    let base = base.as_str().split('#').next().unwrap_or_default();
    let base = IriAbsoluteStr::new(base)?;
    Ok(reference.resolve_against(base).into())
}

/// Transforms an IRI to a reference relative to the given base IRI.
///
/// Returns the IRI unchanged when it does not share the scheme and authority
/// of the base.
pub(crate) fn relativize(iri: &str, base: &IriStr) -> String {
    let base = IriComponents::from(base.as_str());
    let target = IriComponents::from(iri);

    if base.scheme != target.scheme || base.authority != target.authority {
        return iri.to_owned();
    }

    let mut base_segments: Vec<&str> = base.path.split('/').collect();
    let mut target_segments: Vec<&str> = target.path.split('/').collect();
    // Keep the last target segment unless the reference carries its own
    // query or fragment to distinguish it from the base.
    let keep_last = if target.query.is_none() && target.fragment.is_none() {
        1
    } else {
        0
    };
    while !base_segments.is_empty() && target_segments.len() > keep_last {
        if base_segments[0] != target_segments[0] {
            break;
        }
        base_segments.remove(0);
        target_segments.remove(0);
    }

    let mut relative = String::new();
    if !base_segments.is_empty() {
        // The last base segment is the resource itself, not a directory.
        base_segments.pop();
        for _ in &base_segments {
            relative.push_str("../");
        }
    }
    relative.push_str(&target_segments.join("/"));
    if let Some(query) = target.query {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = target.fragment {
        relative.push('#');
        relative.push_str(fragment);
    }
    if relative.is_empty() {
        relative.push_str("./");
    }

    relative
}

/// IRI split into the components relevant for relativization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IriComponents<'a> {
    /// Scheme (without the trailing colon).
    scheme: &'a str,
    /// Authority (without the leading `//`), if any.
    authority: Option<&'a str>,
    /// Path.
    path: &'a str,
    /// Query (without the leading `?`), if any.
    query: Option<&'a str>,
    /// Fragment (without the leading `#`), if any.
    fragment: Option<&'a str>,
}

impl<'a> From<&'a str> for IriComponents<'a> {
    fn from(s: &'a str) -> Self {
        let (rest, fragment) = match s.find('#') {
            Some(pos) => (&s[..pos], Some(&s[(pos + 1)..])),
            None => (s, None),
        };
        let (rest, query) = match rest.find('?') {
            Some(pos) => (&rest[..pos], Some(&rest[(pos + 1)..])),
            None => (rest, None),
        };
        let (scheme, rest) = match rest.find(':') {
            Some(pos) => (&rest[..pos], &rest[(pos + 1)..]),
            None => ("", rest),
        };
        let (authority, path) = match rest.strip_prefix("//") {
            Some(rest) => match rest.find('/') {
                Some(pos) => (Some(&rest[..pos]), &rest[pos..]),
                None => (Some(rest), ""),
            },
            None => (None, rest),
        };

        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_iri_form() {
        assert!(is_absolute_iri("http://example.com/"));
        assert!(is_absolute_iri("urn:isbn:1"));
        assert!(is_absolute_iri("http://example.com/#frag"));
        assert!(is_absolute_iri("_:b0"));
        assert!(!is_absolute_iri("relative/path"));
        assert!(!is_absolute_iri("http://example.com/with space"));
        assert!(!is_absolute_iri("1http:suffix"));
    }

    #[test]
    fn compact_iri_form() {
        assert!(has_compact_iri_form("schema:name"));
        assert!(!has_compact_iri_form(":name"));
        assert!(!has_compact_iri_form("name"));
        assert!(!has_compact_iri_form("_:b0"));
    }

    #[test]
    fn resolve_against_base() {
        let base = IriStr::new("http://example.com/a/b/c").expect("valid IRI");
        assert_eq!(
            resolve("../d", base).expect("resolvable").as_str(),
            "http://example.com/a/d"
        );
        assert_eq!(
            resolve("http://other.example/", base)
                .expect("resolvable")
                .as_str(),
            "http://other.example/"
        );
    }

    #[test]
    fn relativize_against_base() {
        let base = IriStr::new("http://example.com/a/b/c").expect("valid IRI");
        assert_eq!(relativize("http://example.com/a/b/d", base), "d");
        assert_eq!(relativize("http://example.com/a/e", base), "../e");
        assert_eq!(relativize("http://other.example/x", base), "http://other.example/x");
        assert_eq!(relativize("http://example.com/a/b/c#s", base), "#s");
    }
}
