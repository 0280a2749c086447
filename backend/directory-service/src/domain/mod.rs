pub mod models;
pub mod queries;
pub mod requests;
pub mod timestamp;

pub use models::*;
pub use queries::*;
pub use requests::*;
