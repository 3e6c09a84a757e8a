#![forbid(unsafe_code)]

mod args;
mod service;
mod sink;
mod wire;

pub use args::{ArgsError, FieldError, parse_add, parse_order_query, parse_remove, parse_rename, parse_reposition};
pub use service::ChainService;
pub use sink::{ChannelSink, NotificationSink, NullSink};
pub use wire::{EntryPayload, ORDER_UPDATED, order_updated};
