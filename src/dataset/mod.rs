// Dataset validation and retention
pub mod store;
pub mod table;
pub mod validator;

pub use store::DatasetStore;
pub use table::{Dataset, DatasetSummary};
pub use validator::{DatasetFormat, DatasetValidator, ValidationError};
