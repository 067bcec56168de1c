pub mod inventory_repo;
pub mod order_repo;
pub mod payment_repo;
