//! HTTP clients for the two inputs: the GTFS archive and the rail overlay.

mod client;
mod error;

pub use client::{
    FeedClient, FeedClientConfig, OverlayClient, OverlayClientConfig, decode_contents,
};
pub use error::FetchError;
