pub mod error;
pub mod gateway;
pub mod id;
pub mod money;
pub mod order;
pub mod payment;
pub mod signature;
pub mod webhook;
