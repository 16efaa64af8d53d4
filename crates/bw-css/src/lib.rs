//! Style sheet parsing, selector matching and the cascade.

pub mod cascade;
pub mod parser;
pub mod selector;

pub use cascade::RuleStore;
pub use parser::CssParser;
pub use parser::Declaration;
pub use parser::StyleRule;
pub use parser::StyleSheet;
pub use selector::Selector;
pub use selector::SimpleSelector;
