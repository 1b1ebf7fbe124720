//! Rate key derivation.

use std::fmt;
use std::net::IpAddr;

/// Separator between the client and route parts of a key. A pipe is used
/// since it is uncommon in addresses and URL paths.
const KEY_DELIMITER: char = '|';

/// Client identity used when neither a forwarded header nor a peer
/// address is available.
const UNKNOWN_CLIENT: &str = "unknown";

/// A key that uniquely identifies one client on one route.
///
/// Two requests map to the same counting window exactly when their derived
/// keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey(String);

impl RateKey {
    /// Derive a key from the request's client identity and route.
    ///
    /// The client is the first non-empty entry of the forwarded chain
    /// (entries are trimmed before the emptiness check), falling back to
    /// the peer address, then to a shared `unknown` identity. The route is
    /// used verbatim, so differently-cased paths count separately.
    pub fn derive<'a, I>(forwarded_chain: I, peer: Option<IpAddr>, route: &str) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let client = forwarded_chain
            .into_iter()
            .map(str::trim)
            .find(|entry| !entry.is_empty())
            .map(str::to_string)
            .or_else(|| peer.map(|addr| addr.to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Self(format!("{client}{KEY_DELIMITER}{route}"))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
