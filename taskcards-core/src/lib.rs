pub mod errors;
pub mod filters;
pub mod manager;
pub mod models;
pub mod snapshot;
pub mod store;
pub mod tags;

pub use errors::*;
pub use filters::*;
pub use manager::*;
pub use models::*;
pub use snapshot::*;
pub use store::*;
pub use tags::*;
