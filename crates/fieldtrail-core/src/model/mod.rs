pub mod composite;
pub mod entity;
pub mod field_map;
pub mod schema;
pub mod value;

pub use composite::Country;
pub use entity::{EntityKey, Record, TrackedEntity};
pub use field_map::FieldMap;
pub use schema::{EntitySchema, FieldDef, FieldKind};
pub use value::{Composite, CompositeValue, FieldValue};
