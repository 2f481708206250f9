/// Data ingestion from external gauge services.
///
/// - `pegelonline` - PEGELONLINE REST API v2: URL construction, parsing, fetch.
/// - `fixtures` (test only) - representative API response payloads.

pub mod pegelonline;

#[cfg(test)]
pub(crate) mod fixtures;
