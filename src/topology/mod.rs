//! Ownership vocabulary shared by the index set, the wire format and the
//! overlap expander.

pub mod ownership;

pub use ownership::Attribute;
