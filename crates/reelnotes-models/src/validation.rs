use thiserror::Error;

use crate::review::{NewReview, ReviewPatch};

/// Lowest and highest star rating a user may give.
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Input problems caught before anything reaches the review store.
///
/// The store itself accepts any data; these checks belong to whatever front
/// end collects the review.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please write a comment for your review")]
    EmptyComment,
    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i32),
    #[error("A movie id is required")]
    MissingMovieId,
}

fn check_rating(rating: i32) -> Result<(), ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange(rating))
    }
}

fn check_comment(comment: &str) -> Result<String, ValidationError> {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    Ok(trimmed.to_string())
}

impl NewReview {
    /// Check presence and range, returning the review with its comment trimmed.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if self.movie_id.trim().is_empty() {
            return Err(ValidationError::MissingMovieId);
        }
        check_rating(self.rating)?;
        self.comment = check_comment(&self.comment)?;
        Ok(self)
    }
}

impl ReviewPatch {
    /// Same checks as [`NewReview::validate`], applied to the fields present.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        if let Some(comment) = self.comment.take() {
            self.comment = Some(check_comment(&comment)?);
        }
        if matches!(self.movie_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ValidationError::MissingMovieId);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review(rating: i32, comment: &str) -> NewReview {
        NewReview {
            movie_id: "550".to_string(),
            user_id: "user123".to_string(),
            rating,
            comment: comment.to_string(),
            movie_title: "Fight Club".to_string(),
        }
    }

    #[test]
    fn test_valid_review_is_trimmed() {
        let review = new_review(5, "  Great  ").validate().unwrap();
        assert_eq!(review.comment, "Great");
    }

    #[test]
    fn test_blank_comment_rejected() {
        assert_eq!(new_review(3, "   ").validate(), Err(ValidationError::EmptyComment));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(new_review(1, "ok").validate().is_ok());
        assert!(new_review(5, "ok").validate().is_ok());
        assert_eq!(new_review(0, "ok").validate(), Err(ValidationError::RatingOutOfRange(0)));
        assert_eq!(new_review(6, "ok").validate(), Err(ValidationError::RatingOutOfRange(6)));
    }

    #[test]
    fn test_missing_movie_id() {
        let mut review = new_review(4, "ok");
        review.movie_id = " ".to_string();
        assert_eq!(review.validate(), Err(ValidationError::MissingMovieId));
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        assert!(ReviewPatch::default().validate().is_ok());
        assert_eq!(
            ReviewPatch::rating(9).validate(),
            Err(ValidationError::RatingOutOfRange(9))
        );
        let patch = ReviewPatch::comment(" better on rewatch ").validate().unwrap();
        assert_eq!(patch.comment.as_deref(), Some("better on rewatch"));
        assert_eq!(ReviewPatch::comment("").validate(), Err(ValidationError::EmptyComment));
    }
}
