//! The object graph behind the stream cache.
//!
//! Payloads from the server are folded into a [`Store`] where every activity,
//! object, stream and user exists exactly once, no matter how many pages or
//! push notifications mention it.

mod fold;
mod kind;
mod store;
mod stream;
#[cfg(test)]
mod tests;

pub use fold::fold;
pub use kind::{Family, Field, Kind};
pub use store::{Entity, EntityId, Store};
pub use stream::{DEFAULT_PAGE_SIZE, Direction, MAX_PAGE_SIZE, UserStream};
