//! Order lifecycle engine and order store for the marketplace

pub mod commission;
pub mod config;
pub mod repository;
pub mod service;

pub use commission::{compute_split, CommissionSplit};
pub use config::OrderServiceConfig;
pub use repository::{
    InMemoryOrderRepository, OrderFilter, OrderRepository, PostgresOrderRepository,
};
pub use service::{OrderService, RepositoryType};
