//! Cadence Core
//!
//! Foundational primitives shared by the Cadence animation system:
//!
//! - **Property Adapters**: typed get/set/lerp access to animatable values
//! - **Composite Values**: single-channel and single-axis views of colors and vectors
//! - **Owner Liveness**: weak owner references that detect destroyed objects
//! - **Property Registry**: string-keyed adapters with checked types
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Accessor, Axis, Property};
//! use std::cell::Cell;
//!
//! struct Node {
//!     position: Cell<[f32; 2]>,
//! }
//!
//! let x = Accessor::new(|n: &Node| n.position.get(), |n: &Node, v| n.position.set(v))
//!     .part(Axis::X);
//!
//! let node = Node { position: Cell::new([0.0, 4.0]) };
//! x.set(&node, x.lerp(&0.0, &10.0, 0.5));
//! assert_eq!(node.position.get(), [5.0, 4.0]);
//! ```

pub mod error;
pub mod owner;
pub mod property;
pub mod registry;

pub use error::PropertyError;
pub use owner::{Lifeline, Owned, OwnerRef, Part};
pub use property::{
    Accessor, Axis, Channel, Composite, Lerp, PartAccessor, Property, Rgba, SharedProperty,
};
pub use registry::PropertyRegistry;
