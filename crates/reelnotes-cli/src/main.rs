use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{config, movies, review, serve};
use std::path::PathBuf;

mod commands;
mod context;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reelnotes")]
#[command(about = "ReelNotes - browse movies and keep your own reviews")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the movie metadata gateway (HTTP)
    #[command(long_about = "Serve the movie metadata gateway: popular movies, movie details and title search, proxied to TMDB with the configured API key.")]
    Serve {
        /// Address to listen on (overrides server.bind_addr)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Browse movies through TMDB
    Movies {
        #[command(subcommand)]
        cmd: MovieCommands,
    },
    /// Write, list, edit and delete your reviews
    #[command(long_about = "Manage reviews kept in the local review collection. Reviews never leave this machine.")]
    Review {
        #[command(subcommand)]
        cmd: ReviewCommands,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum MovieCommands {
    /// List currently popular movies
    Popular,
    /// Show details of one movie
    Show {
        /// TMDB movie id
        id: String,
    },
    /// Search movies by title
    Search {
        /// Free-text title query
        query: String,
    },
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Write a review for a movie
    Add {
        /// TMDB movie id
        movie_id: String,

        /// Star rating from 1 to 5
        #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
        rating: i32,

        /// Review text
        #[arg(short, long)]
        comment: String,

        /// Author id (defaults to reviews.default_user)
        #[arg(long)]
        user: Option<String>,

        /// Movie title to store (looked up through TMDB when omitted)
        #[arg(long)]
        title: Option<String>,
    },
    /// List reviews for a movie or a user (defaults to your own)
    List {
        /// Only reviews of this movie
        #[arg(long, conflicts_with = "user")]
        movie: Option<String>,

        /// Only reviews by this user
        #[arg(long)]
        user: Option<String>,
    },
    /// Show a single review
    Show {
        id: String,
    },
    /// Change the rating and/or comment of a review
    Edit {
        id: String,

        #[arg(short, long, allow_negative_numbers = true)]
        rating: Option<i32>,

        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Delete a review
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store the TMDB API key in the credentials file
    SetApiKey {
        key: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // `config` must keep working when the config file itself is broken
    let ctx = match cli.command {
        Commands::Config { .. } => context::AppContext::load_lenient(cli.config.clone())?,
        _ => context::AppContext::load(cli.config.clone())?,
    };

    logging::init_logging_with_file(
        cli.verbose,
        cli.quiet,
        ctx.config.logging.json,
        ctx.config.logging.file.clone(),
    )
    .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Serve { bind } => serve::run_serve(&ctx, bind, &output).await,
        Commands::Movies { cmd } => movies::run_movies(&ctx, cmd, &output).await,
        Commands::Review { cmd } => review::run_review(&ctx, cmd, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(&ctx, cmd, &output).await
        }
    };

    // Scripts reading JSON get the failure on stdout too
    if let Err(e) = &result {
        if !output.is_human() {
            output.error(format!("{:#}", e));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_add_args() {
        let cli = Cli::try_parse_from([
            "reelnotes", "review", "add", "550", "--rating", "4", "--comment", "Great",
        ])
        .unwrap();
        match cli.command {
            Commands::Review {
                cmd: ReviewCommands::Add { movie_id, rating, comment, user, title },
            } => {
                assert_eq!(movie_id, "550");
                assert_eq!(rating, 4);
                assert_eq!(comment, "Great");
                assert!(user.is_none());
                assert!(title.is_none());
            }
            _ => panic!("expected review add"),
        }
    }

    #[test]
    fn test_review_list_filters_conflict() {
        assert!(Cli::try_parse_from(["reelnotes", "review", "list", "--movie", "550", "--user", "u1"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["reelnotes", "movies", "popular", "--output", "json", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, output::OutputFormat::Json);
    }
}
