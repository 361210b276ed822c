//! Outbound service clients.

pub mod origin_lookup;

pub use origin_lookup::HttpOriginLookup;
