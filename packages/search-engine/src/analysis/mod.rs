//! Text analysis: HTML to visible text and Russian word normalization.

pub mod html;
pub mod russian;

pub use html::VisibleText;
pub use russian::RussianLemmatizer;
