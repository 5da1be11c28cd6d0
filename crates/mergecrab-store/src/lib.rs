pub mod error;
pub mod input;
pub mod models;
pub mod tables;

// Re-export commonly used types
pub use error::{StoreError, StoreResult};
pub use input::{load_repositories, load_tokens, read_column};
pub use models::{RecordRow, TotalsRow};
pub use tables::{REPOSITORY_HEADER, TOTALS_HEADER, TableStore, merge_rows};
