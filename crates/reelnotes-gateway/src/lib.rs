pub mod error;
pub mod server;
pub mod tmdb;
pub mod traits;

pub use error::GatewayError;
pub use server::{build_router, AppState, UpstreamStatus};
pub use tmdb::TmdbClient;
pub use traits::{movie_title, MetadataSource};
