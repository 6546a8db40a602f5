//! Wire encoding tags
//!
//! Every value travelling through the substrate carries a self-describing
//! encoding tag of the form `<primary>[;<subtype>]`, e.g. `text/plain;int32`
//! or `application/json`. A fixed registry of well-known prefixes maps tags
//! to compact codes; anything outside the registry is carried verbatim as a
//! custom tag, so arbitrary strings round-trip without loss.

use std::borrow::Cow;
use std::fmt;

/// Well-known encoding prefix codes
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum KnownEncoding {
    #[default]
    Empty,
    AppOctetStream,
    AppCustom,
    TextPlain,
    AppProperties,
    AppJson,
    AppSql,
    AppInteger,
    AppFloat,
    AppXml,
    AppXhtmlXml,
    AppXWwwFormUrlencoded,
    TextJson,
    TextHtml,
    TextXml,
    TextCss,
    TextCsv,
    TextJavascript,
    ImageJpeg,
    ImagePng,
    ImageGif,
}

/// Registry of (code, canonical prefix string) pairs
///
/// Order is not significant: lookups match the longest prefix.
pub const ENCODING_REGISTRY: &[(KnownEncoding, &str)] = &[
    (KnownEncoding::Empty, ""),
    (KnownEncoding::AppOctetStream, "application/octet-stream"),
    (KnownEncoding::AppCustom, "application/"),
    (KnownEncoding::TextPlain, "text/plain"),
    (KnownEncoding::AppProperties, "application/properties"),
    (KnownEncoding::AppJson, "application/json"),
    (KnownEncoding::AppSql, "application/sql"),
    (KnownEncoding::AppInteger, "application/integer"),
    (KnownEncoding::AppFloat, "application/float"),
    (KnownEncoding::AppXml, "application/xml"),
    (KnownEncoding::AppXhtmlXml, "application/xhtml+xml"),
    (
        KnownEncoding::AppXWwwFormUrlencoded,
        "application/x-www-form-urlencoded",
    ),
    (KnownEncoding::TextJson, "text/json"),
    (KnownEncoding::TextHtml, "text/html"),
    (KnownEncoding::TextXml, "text/xml"),
    (KnownEncoding::TextCss, "text/css"),
    (KnownEncoding::TextCsv, "text/csv"),
    (KnownEncoding::TextJavascript, "text/javascript"),
    (KnownEncoding::ImageJpeg, "image/jpeg"),
    (KnownEncoding::ImagePng, "image/png"),
    (KnownEncoding::ImageGif, "image/gif"),
];

impl KnownEncoding {
    /// Canonical prefix string for this code
    pub fn prefix(self) -> &'static str {
        ENCODING_REGISTRY
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, s)| *s)
            .unwrap_or("")
    }
}

/// A complete encoding tag: well-known prefix plus free-form suffix
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Encoding {
    prefix: KnownEncoding,
    suffix: Cow<'static, str>,
}

impl Encoding {
    pub const EMPTY: Encoding = Encoding::exact(KnownEncoding::Empty);
    pub const APP_OCTET_STREAM: Encoding = Encoding::exact(KnownEncoding::AppOctetStream);
    pub const APP_JSON: Encoding = Encoding::exact(KnownEncoding::AppJson);
    pub const TEXT_PLAIN: Encoding = Encoding::exact(KnownEncoding::TextPlain);

    /// An encoding consisting of a well-known prefix only
    pub const fn exact(prefix: KnownEncoding) -> Self {
        Encoding {
            prefix,
            suffix: Cow::Borrowed(""),
        }
    }

    /// A well-known prefix refined with a subtype suffix
    pub fn with_suffix(prefix: KnownEncoding, suffix: impl Into<Cow<'static, str>>) -> Self {
        Encoding {
            prefix,
            suffix: suffix.into(),
        }
    }

    /// Parse a tag string against the registry
    ///
    /// The longest matching known prefix wins and the remainder becomes the
    /// suffix. Strings matching no known prefix are preserved in full as a
    /// custom tag, so `parse` never loses information.
    pub fn parse(tag: &str) -> Encoding {
        let mut best: Option<(KnownEncoding, &str)> = None;
        for &(code, prefix) in ENCODING_REGISTRY {
            if prefix.is_empty() || !tag.starts_with(prefix) {
                continue;
            }
            match best {
                Some((_, current)) if current.len() >= prefix.len() => {}
                _ => best = Some((code, prefix)),
            }
        }

        match best {
            Some((code, prefix)) => Encoding {
                prefix: code,
                suffix: Cow::Owned(tag[prefix.len()..].to_string()),
            },
            None => Encoding {
                prefix: KnownEncoding::Empty,
                suffix: Cow::Owned(tag.to_string()),
            },
        }
    }

    #[inline]
    pub fn prefix(&self) -> KnownEncoding {
        self.prefix
    }

    #[inline]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::EMPTY
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix.prefix(), self.suffix)
    }
}

impl From<&str> for Encoding {
    fn from(tag: &str) -> Self {
        Encoding::parse(tag)
    }
}
