pub mod assembler;
pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod templates;
pub mod theme;

pub use assembler::BrochureAssembler;
pub use templates::{select_template, Template};
pub use theme::Theme;

pub mod prelude {
    pub use super::{BrochureAssembler, Template, Theme};
    pub use folio_core::{BrochureContent, BrochureDocument, Error, Result};
}
