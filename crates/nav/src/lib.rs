//! Shared navigation injection
//!
//! Fetches a navigation fragment from a fixed path on the page's own
//! origin and injects it as the first child of the page's `<header>`.
//! Links in the fragment that point at the local authoring placeholder
//! origin are rewritten to the real origin.
//!
//! ```text
//! Location ─▶ guard ─▶ FragmentSource ─▶ parse ─▶ main > div ─▶ <nav>
//!                                                                 │
//!                                  header.prepend(nav) ◀─ rewrite links
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod fetch;
pub mod injector;
pub mod location;
pub mod page;

pub use config::NavConfig;
pub use error::{NavError, Result};
pub use events::{EventBus, NavEvent};
pub use fetch::{FileFragmentSource, FragmentSource, HttpFragmentSource};
pub use injector::{should_inject, NavInjector, Outcome};
pub use location::{Location, Origin};
pub use page::Page;
