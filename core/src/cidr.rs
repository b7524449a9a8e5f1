use serde::{Deserialize, Serialize};

/// An address-group or network address: a bare IP or a CIDR block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Cidr {
    Addr(std::net::IpAddr),
    Net(ipnet::IpNet),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("not a valid CIDR or IP address: {0}")]
pub struct CidrParseError(String);

// === impl Cidr ===

impl Cidr {
    /// Normalizes a bare address to its single-host network so that
    /// `10.0.0.1` and `10.0.0.1/32` compare equal.
    pub fn as_net(&self) -> ipnet::IpNet {
        match self {
            Self::Net(net) => *net,
            Self::Addr(addr) => ipnet::IpNet::from(*addr),
        }
    }
}

impl std::str::FromStr for Cidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(net) = s.parse() {
            return Ok(Self::Net(net));
        }

        if let Ok(addr) = s.parse() {
            return Ok(Self::Addr(addr));
        }

        Err(CidrParseError(s.to_string()))
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Addr(addr) => addr.fmt(f),
            Self::Net(net) => net.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addrs_and_nets() {
        assert_eq!(
            "10.1.2.3".parse::<Cidr>().unwrap(),
            Cidr::Addr("10.1.2.3".parse().unwrap())
        );
        assert_eq!(
            "10.1.0.0/16".parse::<Cidr>().unwrap(),
            Cidr::Net("10.1.0.0/16".parse().unwrap())
        );
        assert!("fd00::/8".parse::<Cidr>().is_ok());
        assert!("not-an-address".parse::<Cidr>().is_err());
        assert!("10.1.0.0/33".parse::<Cidr>().is_err());
    }

    #[test]
    fn addr_normalizes_to_host_net() {
        let addr: Cidr = "192.0.2.7".parse().unwrap();
        let net: Cidr = "192.0.2.7/32".parse().unwrap();
        assert_eq!(addr.as_net(), net.as_net());
    }
}
