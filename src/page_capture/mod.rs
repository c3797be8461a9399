//! Page Capture (SPEC_FULL §4.5): drives a single browser tab through one
//! URL's navigate/settle/reveal/scroll lifecycle and produces a
//! [`schema::PageCaptureResult`].

pub mod capture;
pub mod exclude;
pub mod links;
pub mod reveal;
pub mod schema;

pub use capture::capture;
pub use schema::{Links, PageCaptureResult, Resource};
