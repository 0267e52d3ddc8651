// Content Parser
// Turns generated worksheet text into ordered, typed content items.
// Total over its input: malformed lines degrade to `Text` items, nothing is raised.

pub mod models;
pub mod parser;

pub use models::ContentItem;
pub use parser::parse_content;
