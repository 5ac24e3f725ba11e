//! UPnP services the HTTP layer calls into.
//!
//! Each concern sits behind a trait so a full ContentDirectory
//! implementation can be plugged in; the types here are the minimal ones
//! the server runs with out of the box.

pub mod description;
pub mod events;
pub mod soap;

pub use description::{Description, DescriptionFiles, DescriptionProvider};
pub use events::{EventSubscriptions, SubscriptionRegistry};
pub use soap::{SoapHandler, UnsupportedActions};

use crate::http::request::Request;
use crate::http::response::Response;

/// Extra GET/HEAD endpoint living under a fixed path prefix.
pub trait VendorCommand: Send + Sync {
    fn prefix(&self) -> &str;
    fn handle(&self, request: &Request) -> Response;
}
