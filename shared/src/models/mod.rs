//! Shared domain models

pub mod address;
pub mod order;

pub use address::Address;
pub use order::{
    CustomerInfo, NoteAppend, OrderCreate, OrderItemInput, OrderNote, OrderStatus, PaymentMethod,
    PaymentStatus, PaymentStatusUpdate, PaymentVerification, StatusUpdate,
};
