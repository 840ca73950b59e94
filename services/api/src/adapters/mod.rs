pub mod blob;
pub mod db;
pub mod ml_schema;
pub mod ml_service;

pub use blob::LocalBlobStore;
pub use db::DbAdapter;
pub use ml_service::MlServiceAdapter;
