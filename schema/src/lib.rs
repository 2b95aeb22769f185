//! Shared data for the protofox schema translator.
//!
//! - [`types`]: the intermediate representation (IR) handed to renderers,
//! - [`mapping`]: the scalar and wrapper type tables,
//! - [`model`]: record/enum arena and service specifications (forward input),
//! - [`descriptor`]: compiled descriptor tree (reverse input).
//!
//! ```
//! use protofox_schema::*;
//!
//! let mut models = ModelSet::new();
//! let item = models.add_record("Item", vec![
//!     RecordField::new("id", Annotation::Scalar(Scalar::Uint32)),
//! ]);
//! assert_eq!(models.record(item).unwrap().fields[0].name, "id");
//! assert_eq!(Scalar::Uint32.idl_name(), "uint32");
//! assert_eq!(Cardinality::from_streaming(true, false), Cardinality::StreamUnary);
//! ```

pub mod descriptor;
pub mod mapping;
pub mod model;
pub mod types;

pub use descriptor::*;
pub use mapping::*;
pub use model::*;
pub use types::*;
