// HTTP routes
mod assistant;
mod health;
mod news;
mod scraper;
mod telegram;

pub use assistant::*;
pub use health::*;
pub use news::*;
pub use scraper::*;
pub use telegram::*;
