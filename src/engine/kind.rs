use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One proxy list category. Each kind owns exactly one source and one cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Http,
    Socks4,
    Socks5,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown proxy kind '{0}'")]
pub struct UnknownKind(pub String);

impl ProxyKind {
    pub const ALL: [ProxyKind; 3] = [ProxyKind::Http, ProxyKind::Socks4, ProxyKind::Socks5];
    pub const COUNT: usize = Self::ALL.len();

    pub fn as_str(self) -> &'static str {
        match self {
            ProxyKind::Http => "http",
            ProxyKind::Socks4 => "socks4",
            ProxyKind::Socks5 => "socks5",
        }
    }

    /// Stable slot index, `0..COUNT`.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyKind {
    type Err = UnknownKind;

    // Exact, case-sensitive match on the path segment clients send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProxyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!("http".parse::<ProxyKind>(), Ok(ProxyKind::Http));
        assert_eq!("socks4".parse::<ProxyKind>(), Ok(ProxyKind::Socks4));
        assert_eq!("socks5".parse::<ProxyKind>(), Ok(ProxyKind::Socks5));
    }

    #[test]
    fn test_parse_rejects_unknown_and_case_variants() {
        assert!("HTTP".parse::<ProxyKind>().is_err());
        assert!("socks".parse::<ProxyKind>().is_err());
        assert!("".parse::<ProxyKind>().is_err());
        assert_eq!(
            "https".parse::<ProxyKind>(),
            Err(UnknownKind("https".to_string()))
        );
    }

    #[test]
    fn test_slot_indices_are_dense() {
        let indices: Vec<usize> = ProxyKind::ALL.iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
