pub mod emitter;
pub mod error;
pub mod format;
pub mod layout;
pub mod page;
pub mod parser;
pub mod path;
pub mod template;
pub mod value;

pub use emitter::emit_document;
pub use error::{AccessFault, Error, ParseError, Result, TemplateError};
pub use format::{LayoutConfig, apply_layout, tidy_document};
pub use layout::{Element, ElementRole, Margins, Rect, Size};
pub use page::{Page, PageReport};
pub use parser::{load_document, parse_document};
pub use template::{TemplateSize, load_page, load_pages, load_template_sizes, store_page, store_pages};
pub use value::{NamedVariant, Table, Value};
