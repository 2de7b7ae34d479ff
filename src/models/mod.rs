pub mod data;
pub mod templates;

pub use data::*;
pub use templates::{Template, TemplateCache, TemplateRegistry};
