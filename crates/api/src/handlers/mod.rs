//! Route handlers, one module per resource.

pub mod canvas;
pub mod chat;
pub mod transfer;
pub mod workflows;
