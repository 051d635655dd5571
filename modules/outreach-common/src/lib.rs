pub mod cities;
pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use cities::{default_cities, load_city_file, CitySeed};
pub use config::Config;
pub use error::OutreachError;
pub use normalize::{display_name, normalize};
pub use types::*;
