use crate::context::AppContext;
use crate::output::Output;
use crate::ReviewCommands;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use reelnotes_gateway::{movie_title, MetadataSource};
use reelnotes_models::{average_rating, NewReview, Review, ReviewPatch, UNKNOWN_MOVIE_TITLE};
use tracing::{debug, warn};

pub async fn run_review(ctx: &AppContext, cmd: ReviewCommands, output: &Output) -> Result<()> {
    match cmd {
        ReviewCommands::Add {
            movie_id,
            rating,
            comment,
            user,
            title,
        } => {
            let user_id = user.unwrap_or_else(|| ctx.default_user().to_string());
            let new = NewReview {
                movie_id,
                user_id,
                rating,
                comment,
                movie_title: String::new(),
            }
            .validate()?;

            let movie_title = match title {
                Some(title) => title,
                None => lookup_title(ctx, &new.movie_id, output).await,
            };

            let store = ctx.review_store().await?;
            let review = store
                .create(NewReview { movie_title, ..new })
                .await
                .wrap_err("Failed to save review")?;

            if output.is_human() {
                output.success(format!(
                    "Review {} saved for {}",
                    review.id,
                    review.movie_title.bold()
                ));
            } else {
                output.json(&serde_json::to_value(&review)?);
            }
        }
        ReviewCommands::List { movie, user } => {
            let store = ctx.review_store().await?;
            let (reviews, heading) = match movie {
                Some(movie_id) => {
                    let reviews = store.list_by_movie(&movie_id).await?;
                    (reviews, format!("Reviews of movie {}", movie_id))
                }
                None => {
                    let user_id = user.unwrap_or_else(|| ctx.default_user().to_string());
                    let reviews = store.list_by_user(&user_id).await?;
                    (reviews, format!("Reviews by {}", user_id))
                }
            };
            print_reviews(&heading, &reviews, output);
        }
        ReviewCommands::Show { id } => {
            let store = ctx.review_store().await?;
            match store.get(&id).await? {
                Some(review) => print_review(&review, output),
                None => output.warn(format!("Review {} not found", id)),
            }
        }
        ReviewCommands::Edit {
            id,
            rating,
            comment,
        } => {
            let patch = ReviewPatch {
                rating,
                comment,
                ..ReviewPatch::default()
            };
            if patch.is_empty() {
                output.warn("Nothing to change; pass --rating and/or --comment");
                return Ok(());
            }
            let patch = patch.validate()?;

            let store = ctx.review_store().await?;
            match store.update(&id, patch).await.wrap_err("Failed to update review")? {
                Some(review) => {
                    if output.is_human() {
                        output.success(format!("Review {} updated", review.id));
                    } else {
                        output.json(&serde_json::to_value(&review)?);
                    }
                }
                None => output.warn(format!("Review {} not found", id)),
            }
        }
        ReviewCommands::Delete { id } => {
            let store = ctx.review_store().await?;
            if store.delete(&id).await.wrap_err("Failed to delete review")? {
                output.success(format!("Review {} deleted", id));
            } else {
                output.warn(format!("Review {} not found", id));
            }
        }
    }

    Ok(())
}

/// Title shown with the review; a failed lookup is not fatal.
async fn lookup_title(ctx: &AppContext, movie_id: &str, output: &Output) -> String {
    let source = match ctx.metadata_source() {
        Ok(source) => source,
        Err(e) => {
            warn!("Could not build metadata client: {}", e);
            return UNKNOWN_MOVIE_TITLE.to_string();
        }
    };

    match source.movie(movie_id).await {
        Ok(details) => match movie_title(&details) {
            Some(title) => {
                debug!(movie_id, title = %title, "Resolved movie title");
                title
            }
            None => UNKNOWN_MOVIE_TITLE.to_string(),
        },
        Err(e) => {
            warn!(movie_id, error = %e, "Movie title lookup failed");
            output.warn(format!(
                "Could not look up movie {}; saving as \"{}\"",
                movie_id, UNKNOWN_MOVIE_TITLE
            ));
            UNKNOWN_MOVIE_TITLE.to_string()
        }
    }
}

fn stars(rating: i32) -> String {
    let filled = rating.clamp(0, 5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn rating_color(rating: i32) -> Color {
    match rating {
        r if r >= 4 => Color::Green,
        3 => Color::Yellow,
        _ => Color::Red,
    }
}

fn print_reviews(heading: &str, reviews: &[Review], output: &Output) {
    if !output.is_human() {
        output.json(&serde_json::json!({
            "reviews": reviews,
            "count": reviews.len(),
            "averageRating": average_rating(reviews),
        }));
        return;
    }

    if reviews.is_empty() {
        output.info(format!("{}: none yet", heading));
        return;
    }

    output.println(heading.bold().to_string());
    output.println(review_table(reviews).to_string());
    output.println(average_summary(reviews));
}

pub(crate) fn review_table(reviews: &[Review]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Movie").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("User").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Rating").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Comment").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Date").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for review in reviews {
        table.add_row(vec![
            Cell::new(&review.id),
            Cell::new(&review.movie_title),
            Cell::new(&review.user_id),
            Cell::new(stars(review.rating)).fg(rating_color(review.rating)),
            Cell::new(&review.comment),
            Cell::new(review.created_at.format("%Y-%m-%d")),
        ]);
    }
    table
}

/// "4.5/5 (2 reviews)", or "No reviews yet".
pub(crate) fn average_summary(reviews: &[Review]) -> String {
    match average_rating(reviews) {
        Some(avg) => format!("{:.1}/5 ({} reviews)", avg, reviews.len()),
        None => "No reviews yet".to_string(),
    }
}

fn print_review(review: &Review, output: &Output) {
    if !output.is_human() {
        output.json(&serde_json::json!(review));
        return;
    }

    output.println(format!("{} ({})", review.movie_title.bright_cyan().bold(), review.movie_id));
    output.println(format!("{}  by {}", stars(review.rating), review.user_id));
    output.println(&review.comment);
    let mut dates = format!("Written {}", review.created_at.format("%Y-%m-%d %H:%M UTC"));
    if review.updated_at != review.created_at {
        dates.push_str(&format!(", edited {}", review.updated_at.format("%Y-%m-%d %H:%M UTC")));
    }
    output.println(dates.dimmed().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(4), "★★★★☆");
        assert_eq!(stars(5), "★★★★★");
        // Stored ratings are not range checked
        assert_eq!(stars(9), "★★★★★");
        assert_eq!(stars(-1), "☆☆☆☆☆");
    }

    #[test]
    fn test_average_summary() {
        let mut reviews = reelnotes_models::fixture_reviews();
        assert_eq!(average_summary(&reviews), "4.5/5 (2 reviews)");
        reviews.clear();
        assert_eq!(average_summary(&reviews), "No reviews yet");
    }

    #[test]
    fn test_rating_color() {
        assert_eq!(rating_color(5), Color::Green);
        assert_eq!(rating_color(4), Color::Green);
        assert_eq!(rating_color(3), Color::Yellow);
        assert_eq!(rating_color(1), Color::Red);
    }
}
