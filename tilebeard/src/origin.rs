//! Origin selection.
//!
//! A pure decision table mapping the adapter's static configuration to one
//! of the three tile-resolution strategies. Runs exactly once, at adapter
//! construction; invalid combinations are configuration errors, never
//! per-request failures.

use crate::error::ConfigError;

/// The strategy used to obtain tile bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Pre-rendered file read from a local pyramid.
    Local,
    /// Remote fetch, cached to the local path when one is configured.
    Proxy,
    /// On-demand generation, cached to the local path when one is
    /// configured.
    Generated,
}

/// Selects the origin strategy from the three configuration booleans.
///
/// | path | url | source | origin |
/// |------|-----|--------|--------|
/// | yes  | no  | no     | Local |
/// | no   | yes | no     | Proxy |
/// | yes  | yes | no     | Proxy, path used as cache |
/// | no   | no  | yes    | Generated |
/// | yes  | no  | yes    | Generated, path used as cache |
///
/// The remaining three combinations fail: nothing configured, or a url
/// together with a source (ambiguous).
pub fn select_origin(
    has_path: bool,
    has_url: bool,
    has_source: bool,
) -> Result<Origin, ConfigError> {
    match (has_path, has_url, has_source) {
        (true, false, false) => Ok(Origin::Local),
        (false, true, false) | (true, true, false) => Ok(Origin::Proxy),
        (false, false, true) | (true, false, true) => Ok(Origin::Generated),
        (false, false, false) => Err(ConfigError::NoOrigin),
        (_, true, true) => Err(ConfigError::AmbiguousOrigin),
    }
}
