pub mod bulletin;
pub mod llm;
pub mod search;
pub mod weather;

pub use bulletin::{BulletinSource, LwdBulletinSource};
pub use llm::{LlmProvider, OllamaProvider};
pub use search::{DuckDuckGoProvider, SearchProvider};
pub use weather::{ForecastResponse, OpenMeteoProvider, WeatherProvider};
