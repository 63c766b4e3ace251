//! Conditional-request evaluation.
//!
//! Compares caller-supplied validators (`If-Modified-Since`,
//! `If-None-Match`) against a tile's current validators. When at least one
//! request validator is present and every present one matches exactly, the
//! tile can be served as `304 Not Modified` without touching the body.
//!
//! Validators are recomputed fresh on every request, so a changed file
//! mtime is reflected even while body bytes are still served from the
//! in-memory record. This is the intended cheap freshness check.

/// Validators extracted from request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestValidators {
    /// Value of the `If-Modified-Since` header, verbatim.
    pub if_modified_since: Option<String>,
    /// Value of the `If-None-Match` header, verbatim.
    pub if_none_match: Option<String>,
}

impl RequestValidators {
    /// Extracts the recognized validators from a header iterator.
    /// Header names are matched case-insensitively.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut out = Self::default();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("if-modified-since") {
                out.if_modified_since = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("if-none-match") {
                out.if_none_match = Some(value.to_string());
            }
        }
        out
    }

    /// Whether any validator is present.
    pub fn is_empty(&self) -> bool {
        self.if_modified_since.is_none() && self.if_none_match.is_none()
    }
}

/// A tile's current validators.
///
/// `last_modified` is absent for origins without a timestamp scheme
/// (uncached proxy tiles); such tiles can still match on etag alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub last_modified: Option<String>,
    pub etag: String,
}

/// Evaluates the conditional short-circuit.
///
/// Returns `true` (serve 304) when at least one request validator is
/// present and **every** present validator matches the tile's current value
/// by exact string equality. A present request validator with no
/// corresponding current value never matches.
pub fn not_modified(request: &RequestValidators, current: &Validators) -> bool {
    if request.is_empty() {
        return false;
    }
    if let Some(ref ims) = request.if_modified_since {
        match current.last_modified {
            Some(ref lm) if lm == ims => {}
            _ => return false,
        }
    }
    if let Some(ref inm) = request.if_none_match {
        if *inm != current.etag {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Validators {
        Validators {
            last_modified: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            etag: "42abc".to_string(),
        }
    }

    #[test]
    fn test_no_validators_is_full_response() {
        assert!(!not_modified(&RequestValidators::default(), &current()));
    }

    #[test]
    fn test_matching_etag_short_circuits() {
        let req = RequestValidators {
            if_none_match: Some("42abc".to_string()),
            ..Default::default()
        };
        assert!(not_modified(&req, &current()));
    }

    #[test]
    fn test_stale_etag_is_full_response() {
        let req = RequestValidators {
            if_none_match: Some("00000".to_string()),
            ..Default::default()
        };
        assert!(!not_modified(&req, &current()));
    }

    #[test]
    fn test_matching_last_modified_short_circuits() {
        let req = RequestValidators {
            if_modified_since: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            ..Default::default()
        };
        assert!(not_modified(&req, &current()));
    }

    #[test]
    fn test_both_present_both_must_match() {
        let req = RequestValidators {
            if_modified_since: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            if_none_match: Some("stale".to_string()),
        };
        assert!(!not_modified(&req, &current()));

        let req = RequestValidators {
            if_modified_since: Some("Mon, 07 Nov 1994 00:00:00 GMT".to_string()),
            if_none_match: Some("42abc".to_string()),
        };
        assert!(!not_modified(&req, &current()));

        let req = RequestValidators {
            if_modified_since: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            if_none_match: Some("42abc".to_string()),
        };
        assert!(not_modified(&req, &current()));
    }

    #[test]
    fn test_ims_without_current_timestamp_never_matches() {
        let proxy_validators = Validators {
            last_modified: None,
            etag: "42abc".to_string(),
        };
        let req = RequestValidators {
            if_modified_since: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            ..Default::default()
        };
        assert!(!not_modified(&req, &proxy_validators));

        // Etag alone still matches
        let req = RequestValidators {
            if_none_match: Some("42abc".to_string()),
            ..Default::default()
        };
        assert!(not_modified(&req, &proxy_validators));
    }

    #[test]
    fn test_from_headers_case_insensitive() {
        let headers = vec![
            ("If-None-Match", "42abc"),
            ("IF-MODIFIED-SINCE", "yesterday"),
            ("Accept", "image/png"),
        ];
        let req = RequestValidators::from_headers(headers);
        assert_eq!(req.if_none_match.as_deref(), Some("42abc"));
        assert_eq!(req.if_modified_since.as_deref(), Some("yesterday"));
    }
}
