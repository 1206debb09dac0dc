pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::BeerFilter;
pub use repository::{
    BeerOrderRepository, BeerRepository, BeerRepositoryExt, CustomerRepository,
    ShipmentRepository, Store,
};
