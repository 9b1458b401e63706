pub mod fields;

pub use fields::{split_fields, CanonicalField, FieldKind, FieldValue, LegacyFields, FIELD_COUNT};
