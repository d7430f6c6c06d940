//! Schema-driven forms: field schemas, value shaping, validation, and the
//! collapse/expand layout.

pub mod advanced;
pub mod component;
pub mod date;
pub mod handle;
pub mod methods;
pub mod props;
pub mod schema;
pub mod state;
pub mod validation;
pub mod value;
mod values;

pub use advanced::{AdvanceState, Breakpoints, EmptySpan, Screen};
pub use component::ComponentType;
pub use handle::{FormHandle, PendingResult};
pub use methods::{FormEvent, SchemaForm};
pub use props::{FieldMapToTime, SchemaFormProps, ValidateTrigger};
pub use schema::{ColProps, ComponentProps, FormSchema, SchemaPatch, VShow};
pub use validation::{FormValidator, Rule, RuleType, RuleValidator};
pub use value::{FormModel, FormValue};
