//! Clients for the REST endpoints the cache reads from.

pub mod pump;
