//! Item domain: the stored record, request bodies and status normalization.

pub mod status;
pub mod timestamp;
pub mod types;

pub use status::Status;
pub use types::{
    CreateItemRequest, DeletedItem, Item, ItemId, ItemPatch, NewItem, UpdateItemRequest,
};
