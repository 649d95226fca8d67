//! PDF generation: font metrics, a multi-page canvas, layout helpers, and
//! the three renderers (documents, paystubs, verification letters).

pub mod document;
pub mod format;
pub mod layout;
pub mod metrics;
pub mod page;
pub mod paystub;
pub mod verification;

pub use page::RenderedPdf;
