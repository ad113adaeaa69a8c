use chrono::{DateTime, NaiveDate, Utc};

use crate::review::Review;

fn midnight_utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Bootstrap reviews written into an empty collection on first access.
pub fn fixture_reviews() -> Vec<Review> {
    let first = midnight_utc(2024, 1, 15);
    let second = midnight_utc(2024, 1, 20);
    vec![
        Review {
            id: "1".to_string(),
            movie_id: "550".to_string(),
            user_id: "user456".to_string(),
            rating: 5,
            comment: "One of the best movies ever! The plot twists are incredible.".to_string(),
            movie_title: "Fight Club".to_string(),
            created_at: first,
            updated_at: first,
        },
        Review {
            id: "2".to_string(),
            movie_id: "680".to_string(),
            user_id: "user789".to_string(),
            rating: 4,
            comment: "Great acting and storyline. A classic must-watch!".to_string(),
            movie_title: "Pulp Fiction".to_string(),
            created_at: second,
            updated_at: second,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_have_distinct_ids_and_dates() {
        let reviews = fixture_reviews();
        assert_eq!(reviews.len(), 2);
        assert_ne!(reviews[0].id, reviews[1].id);
        assert_eq!(reviews[0].created_at.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert_eq!(reviews[1].movie_title, "Pulp Fiction");
    }
}
