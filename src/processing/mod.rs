//! # Processing Module
//!
//! Filters, the ordered filter catalog, the render sweep that fills a
//! [`RenderCache`], gallery selection and input normalization.

pub mod filter;
pub mod normalize;
pub mod render;
pub mod report;
pub mod selection;

pub use filter::{
    Filter, FilterCatalog, IdentityFilter, StyleTransferFilter, IDENTITY_FILTER_NAME, STANDARD_STYLES,
};
pub use normalize::Normalizer;
pub use render::{render_all, render_sweep, select, RenderCache};
pub use report::{FilterOutcome, FilterReport, SweepReport};
pub use selection::Gallery;
