//! Listing acquisition from the rental search API.
//!
//! - `source` - the [`ListingSource`] trait the poller consumes
//! - `streeteasy` - GraphQL client and wire-to-model mapping
//! - `error` - [`FetchError`]

pub mod error;
pub mod source;
pub mod streeteasy;

pub use error::*;
pub use source::*;
pub use streeteasy::*;
