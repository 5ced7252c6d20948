mod catalog;
mod service;

pub use crate::error::AdminError;
pub use catalog::AdminCatalog;
pub use service::AdminService;
