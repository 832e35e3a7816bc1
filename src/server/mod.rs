// HTTP delivery layer.

pub mod handler;
