pub mod fixtures;
pub mod review;
pub mod validation;

pub use fixtures::fixture_reviews;
pub use review::{average_rating, NewReview, Review, ReviewPatch, DEFAULT_USER_ID, UNKNOWN_MOVIE_TITLE};
pub use validation::ValidationError;
