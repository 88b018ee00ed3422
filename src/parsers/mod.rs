pub mod html;
pub mod meta;


pub use html::{DEFAULT_CONTENT_SELECTOR, DEFAULT_LOCALE, extract_page};
