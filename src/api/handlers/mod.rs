//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod not_found;
pub mod resources;

pub use not_found::not_found_handler;
pub use resources::{
    Collection, create_handler, delete_handler, get_handler, list_handler, update_handler,
};
