//! Form core: the field registry, the flat `BriefRecord` value, validation and export encoders.

mod error;
pub mod export;
pub mod field;
pub mod record;
pub mod validate;

pub use error::RecordError;
pub use field::{Cardinality, Field, all_fields};
pub use record::{BriefRecord, FieldValue};
pub use validate::{ValidationResult, is_valid_email, is_valid_phone, validate};
