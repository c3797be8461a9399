//! URL canonicalization and scope decisions.
//!
//! Every other component keys its state off the output of [`normalize`]; the
//! visited set, the URL map, and the manifest all use the normalized string
//! as the canonical identity of a URL.

mod classify;
mod normalize;
mod path;
mod scope;

pub use classify::{is_asset, Classification};
pub use normalize::normalize;
pub use path::{sanitize_component, url_to_path, Layout};
pub use scope::{base_dir, in_scope, registrable_domain, Scope};
