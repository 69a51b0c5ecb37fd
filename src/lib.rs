//! A small virtual node renderer.
//!
//! Virtual trees ([`vnode::VNode`]) are [normalized](`normalize`) (function components resolved, empty nodes dropped),
//! then [materialized](`materialize`) into or [reconciled](`reconcile`) against a [`host::HostTree`].
//! Handlers are registered per host node in an [`events::EventRegistry`] and dispatched through [one native listener per event type](`delegate`) on each render [`render::Root`].
//!
//! [`memory::MemoryTree`] is an in-memory host tree. With the `web` feature, [`web::WebTree`] renders into the browser DOM.

#![doc(html_root_url = "https://docs.rs/twig-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attributes;
pub mod delegate;
pub mod error;
pub mod events;
pub mod host;
pub mod materialize;
pub mod memory;
pub mod normalize;
pub mod reconcile;
pub mod render;
pub mod vnode;
#[cfg(feature = "web")]
pub mod web;

pub use error::{HostError, RenderError};
pub use events::{Event, Handler};
pub use render::{RenderOptions, Root};
pub use vnode::{build, h, VNode};
