//! The Variable value record
//!
//! A `Variable` is one delivered or queried value: topic, payload bytes,
//! encoding tag and a decimal nanosecond timestamp. Each field is either a
//! borrowed view into substrate-owned memory or an owned copy. Borrowed
//! views are only valid for the duration of the delivering callback or
//! query-iteration step; anything retained past that boundary must be
//! promoted with [`Variable::own`] or converted with
//! [`Variable::into_owned`] first.

use std::borrow::Cow;

/// An immutable delivered/queried value with borrowed-or-owned fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable<'a> {
    topic: Cow<'a, str>,
    value: Cow<'a, [u8]>,
    encoding: Cow<'a, str>,
    timestamp: Cow<'a, str>,
}

impl<'a> Variable<'a> {
    pub fn new(
        topic: impl Into<Cow<'a, str>>,
        value: impl Into<Cow<'a, [u8]>>,
        encoding: impl Into<Cow<'a, str>>,
        timestamp: impl Into<Cow<'a, str>>,
    ) -> Self {
        Variable {
            topic: topic.into(),
            value: value.into(),
            encoding: encoding.into(),
            timestamp: timestamp.into(),
        }
    }

    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Payload interpreted as UTF-8, if it is valid UTF-8
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    #[inline]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Nanoseconds since the Unix epoch, as decimal text
    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Promote every borrowed field to an owned copy
    ///
    /// No-op if already owned; safe to call repeatedly.
    pub fn own(&mut self) {
        fn promote_str(field: &mut Cow<'_, str>) {
            if let Cow::Borrowed(view) = *field {
                *field = Cow::Owned(view.to_string());
            }
        }
        promote_str(&mut self.topic);
        promote_str(&mut self.encoding);
        promote_str(&mut self.timestamp);
        if let Cow::Borrowed(view) = self.value {
            self.value = Cow::Owned(view.to_vec());
        }
    }

    /// Whether every field is already an owned copy
    pub fn is_owned(&self) -> bool {
        matches!(self.topic, Cow::Owned(_))
            && matches!(self.value, Cow::Owned(_))
            && matches!(self.encoding, Cow::Owned(_))
            && matches!(self.timestamp, Cow::Owned(_))
    }

    /// Consume and detach from the delivery frame entirely
    pub fn into_owned(self) -> Variable<'static> {
        Variable {
            topic: Cow::Owned(self.topic.into_owned()),
            value: Cow::Owned(self.value.into_owned()),
            encoding: Cow::Owned(self.encoding.into_owned()),
            timestamp: Cow::Owned(self.timestamp.into_owned()),
        }
    }
}
