//! Timetable extraction from HIO ("HISinOne") university portals
//!
//! The pipeline runs strictly in order, one blocking request at a time:
//!
//! 1. [`SessionClient`] opens a session and harvests the authenticity token
//! 2. [`TreeExpander`] expands the course catalog tree
//! 3. [`decode_tree`] turns the expanded tree into a [`CourseCatalog`]
//! 4. [`DetailEnricher`] fills in module and module part details
//! 5. [`expand_events`] builds the export directory tree and concrete events

pub mod detail;
mod error;
pub mod events;
mod html;
pub mod model;
pub mod session;
pub mod tree;

pub use detail::DetailEnricher;
pub use error::{Error, Result};
pub use events::{Directory, DirectoryEvent, Event, ExportResult, expand_events};
pub use model::CourseCatalog;
pub use session::{Portal, SessionClient, SessionSettings};
pub use tree::{TreeExpander, decode_tree};

/// An enriched catalog together with the period it was extracted for
#[derive(Debug)]
pub struct Extraction {
    pub period_id: u64,
    pub catalog: CourseCatalog,
}

/// Expand, decode and enrich the course catalog of one portal.
///
/// Opens the course catalog flow, expands every faculty and study course,
/// decodes the resulting tree and then visits the detail page of every module
/// and module part. All requests are issued one after another on `portal`.
///
/// # Returns
/// The enriched catalog and its period id on success. Any failed request or
/// missing required element aborts the whole extraction.
pub fn extract_catalog<P: Portal>(portal: &P) -> Result<Extraction> {
    let document = TreeExpander::start(portal)?.expand()?;
    let tree::DecodedTree {
        period_id,
        mut catalog,
    } = decode_tree(&document)?;

    DetailEnricher::new(portal, period_id).enrich(&mut catalog)?;

    Ok(Extraction { period_id, catalog })
}

/// Run the whole pipeline against a live portal and return the export view.
pub fn run_extraction(settings: &SessionSettings) -> Result<ExportResult> {
    let session = SessionClient::connect(settings)?;
    let extraction = extract_catalog(&session)?;
    expand_events(&extraction.catalog)
}
