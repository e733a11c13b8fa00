//! MongoDB connection and the handle exposed to the server

mod connector;
mod mongo;

pub use connector::{Connect, LazyConnector, MongoConnector};
pub use mongo::Db;
