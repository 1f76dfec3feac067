pub mod dto;
pub mod services;

// Re-export key types for convenience
pub use dto::{
    ApproveTransferRequest, CancelTransferRequest, CreateTransferRequest, ReceiveTransferRequest,
};
pub use services::TransferService;
