use crate::context::AppContext;
use crate::output::Output;
use crate::MovieCommands;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use reelnotes_gateway::MetadataSource;
use reelnotes_models::{average_rating, Review};
use serde_json::{json, Value};

use super::review::{average_summary, review_table};

pub async fn run_movies(ctx: &AppContext, cmd: MovieCommands, output: &Output) -> Result<()> {
    let source = ctx.metadata_source()?;

    match cmd {
        MovieCommands::Popular => {
            let payload = source.popular().await.wrap_err("Failed to fetch movies from TMDB")?;
            print_listing(&payload, output);
        }
        MovieCommands::Search { query } => {
            let payload = source.search(&query).await.wrap_err("Failed to search movies")?;
            print_listing(&payload, output);
        }
        MovieCommands::Show { id } => {
            let payload = source.movie(&id).await.wrap_err("Failed to fetch movie details")?;
            let reviews = ctx
                .review_store()
                .await?
                .list_by_movie(&id)
                .await
                .wrap_err("Failed to read reviews")?;
            if output.is_human() {
                for line in detail_lines(&payload, &reviews) {
                    output.println(line);
                }
            } else {
                output.json(&detail_json(payload, &reviews));
            }
        }
    }

    Ok(())
}

/// "1999" from a TMDB `release_date` of "1999-10-15".
fn release_year(movie: &Value) -> String {
    movie["release_date"]
        .as_str()
        .and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or("Unknown Year")
        .to_string()
}

fn vote_summary(movie: &Value) -> String {
    match (movie["vote_average"].as_f64(), movie["vote_count"].as_u64()) {
        (Some(avg), Some(count)) if count > 0 => format!("{:.1}/10 ({} votes)", avg, count),
        _ => "No ratings".to_string(),
    }
}

fn print_listing(payload: &Value, output: &Output) {
    if !output.is_human() {
        output.json(payload);
        return;
    }

    let movies = payload["results"].as_array().cloned().unwrap_or_default();
    if movies.is_empty() {
        output.info("No movies found");
        return;
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Rating").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for movie in &movies {
        table.add_row(vec![
            Cell::new(movie["id"].to_string()),
            Cell::new(movie["title"].as_str().unwrap_or("<untitled>")),
            Cell::new(release_year(movie)),
            Cell::new(vote_summary(movie)),
        ]);
    }
    output.println(table.to_string());
}

/// TMDB facts followed by the local reviews of the movie.
fn detail_lines(movie: &Value, reviews: &[Review]) -> Vec<String> {
    let title = movie["title"].as_str().unwrap_or("<untitled>");
    let mut lines = vec![format!("{} ({})", title.bright_cyan().bold(), release_year(movie))];

    let genres: Vec<&str> = movie["genres"]
        .as_array()
        .map(|g| g.iter().filter_map(|g| g["name"].as_str()).collect())
        .unwrap_or_default();
    if !genres.is_empty() {
        lines.push(genres.join(", "));
    }
    if let Some(runtime) = movie["runtime"].as_u64().filter(|r| *r > 0) {
        lines.push(format!("Runtime: {}h {}m", runtime / 60, runtime % 60));
    }
    lines.push(format!("TMDB: {}", vote_summary(movie)));
    lines.push(format!("Our users: {}", average_summary(reviews)));
    if let Some(overview) = movie["overview"].as_str().filter(|o| !o.is_empty()) {
        lines.push(String::new());
        lines.push(overview.to_string());
    }

    lines.push(String::new());
    lines.push(format!("User Reviews ({})", reviews.len()).bold().to_string());
    if reviews.is_empty() {
        lines.push("No reviews yet. Be the first: reelnotes review add <movie-id> --comment ...".to_string());
    } else {
        lines.push(review_table(reviews).to_string());
    }
    lines
}

fn detail_json(movie: Value, reviews: &[Review]) -> Value {
    json!({
        "movie": movie,
        "reviews": reviews,
        "reviewCount": reviews.len(),
        "averageRating": average_rating(reviews),
    })
}
