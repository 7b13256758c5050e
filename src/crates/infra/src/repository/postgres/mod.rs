pub mod catalog;
pub mod command;
pub mod db_data;
pub mod error;
pub mod filter;
pub mod query;
pub mod schema;
pub mod unit_of_work;

pub use catalog::CatalogRepository;
pub use error::StoreError;
pub use unit_of_work::{Conn, TxExecutor, UnitOfWork};
