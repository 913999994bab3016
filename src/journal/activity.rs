use crate::journal::classify::Priority;
use crate::journal::util::serialize_local;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// A classified user message inside the requested window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    #[serde(serialize_with = "serialize_local")]
    pub timestamp: DateTime<Tz>,
    pub text: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<String>,
    pub priority: Priority,
    pub source: String,
}

/// Audit-trail entry for any role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    #[serde(serialize_with = "serialize_local")]
    pub timestamp: DateTime<Tz>,
    pub role: String,
    pub text: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningNote {
    #[serde(serialize_with = "serialize_local")]
    pub timestamp: DateTime<Tz>,
    pub text: String,
    pub source: String,
}

/// Anything the deduplicator can key on.
pub trait Stamped {
    fn timestamp(&self) -> &DateTime<Tz>;
    fn text(&self) -> &str;
}

macro_rules! impl_stamped {
    ($($ty:ty),*) => {
        $(impl Stamped for $ty {
            fn timestamp(&self) -> &DateTime<Tz> {
                &self.timestamp
            }

            fn text(&self) -> &str {
                &self.text
            }
        })*
    };
}

impl_stamped!(Activity, TimelineEvent, LearningNote);
