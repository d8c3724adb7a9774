//! Client for resource-oriented HTTP APIs.
//!
//! Collections are addressed through a fluent graph ([`Client`] →
//! [`Namespace`] → [`Collection`] → [`Resource`] → [`Action`]) and queried
//! through lazily paginated [`ResultView`]s filtered with RQL expressions.

pub mod config;
pub mod cursor;
pub mod errors;
pub mod graph;
pub mod projection;
pub mod range;
pub mod result_view;
pub mod transport;

pub use config::ClientConfig;
pub use cursor::PageCursor;
pub use errors::ClientError;
pub use graph::{Action, Client, Collection, Namespace, Resource};
pub use range::ContentRange;
pub use result_view::{ResultView, Values, DEFAULT_PAGE_SIZE};
pub use transport::{HttpTransport, MutateResponse, Page, Transport, Verb};

pub use rql;

#[cfg(test)]
mod test_helpers;
