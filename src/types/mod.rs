//! Small value types shared by every engine component.

pub mod geometry;
pub mod ids;
pub mod non_empty;

pub use geometry::{Point, Rect, Size};
pub use ids::{ApplicationId, ConnectionId, ElementId, Id, LineageId, MutationId, SchemaId};
pub use non_empty::NonEmptyVec;
