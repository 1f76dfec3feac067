pub mod transfer;

pub use transfer::{
    ApproveTransferRequest, CancelTransferRequest, CreateTransferRequest, ReceiveTransferRequest,
};
