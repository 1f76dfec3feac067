//! Application services

mod transfer;

pub use transfer::TransferService;
