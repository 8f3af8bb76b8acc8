pub mod history;
pub mod matching;

pub use history::*;
pub use matching::*;
