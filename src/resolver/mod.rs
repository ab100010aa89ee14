//! Target resolution for listeners.
//!
//! The [`Resolver`] trait is the seam between the registry and whatever
//! constructs listener targets; [`InMemoryResolver`] is the embedded
//! implementation.

mod memory;
mod traits;

pub use memory::InMemoryResolver;
pub use traits::{Binding, Factory, Resolved, Resolver};
