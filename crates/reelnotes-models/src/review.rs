use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title stored on a review when the movie's own title could not be looked up.
pub const UNKNOWN_MOVIE_TITLE: &str = "Unknown Movie";

/// Author id used when the caller does not name one (there is no login).
pub const DEFAULT_USER_ID: &str = "user123";

/// A single user's opinion of a single movie.
///
/// Field names serialize in camelCase; this is the on-disk format of the
/// review slot and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub movie_id: String,
    pub user_id: String,
    // Plain integer on purpose: the store keeps whatever it is given
    pub rating: i32,
    pub comment: String,
    pub movie_title: String, // Copy of the title at review time, never refreshed
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

/// `2024-01-15T00:00:00.000Z`: RFC 3339 in UTC with exactly three fractional
/// digits. Reading accepts any RFC 3339 timestamp.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

impl Review {
    /// Build a review from creation input, stamping both timestamps with `now`.
    pub fn from_new(id: String, new: NewReview, now: DateTime<Utc>) -> Self {
        Self {
            id,
            movie_id: new.movie_id,
            user_id: new.user_id,
            rating: new.rating,
            comment: new.comment,
            movie_title: new.movie_title,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow merge: fields absent from the patch keep their value.
    /// `id` and `created_at` never change; `updated_at` becomes `now`.
    pub fn apply(&mut self, patch: ReviewPatch, now: DateTime<Utc>) {
        if let Some(movie_id) = patch.movie_id {
            self.movie_id = movie_id;
        }
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(comment) = patch.comment {
            self.comment = comment;
        }
        if let Some(movie_title) = patch.movie_title {
            self.movie_title = movie_title;
        }
        self.updated_at = now;
    }
}

/// Creation input: a review without `id`, `createdAt` or `updatedAt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub movie_id: String,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
    pub movie_title: String,
}

/// Partial fields for an update. `None` means "leave as is".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_title: Option<String>,
}

impl ReviewPatch {
    pub fn rating(rating: i32) -> Self {
        Self {
            rating: Some(rating),
            ..Self::default()
        }
    }

    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movie_id.is_none()
            && self.user_id.is_none()
            && self.rating.is_none()
            && self.comment.is_none()
            && self.movie_title.is_none()
    }
}

/// Mean rating of the given reviews, `None` for an empty slice.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    Some(sum as f64 / reviews.len() as f64)
}
