use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zsock_transport::Direction;

/// The fixed messaging role of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pattern {
    Push,
    Pull,
    Pub,
    Sub,
    Req,
    Rep,
    Router,
    Dealer,
    XPub,
    XSub,
    Pair,
    Stream,
}

impl Pattern {
    pub const ALL: [Pattern; 12] = [
        Pattern::Push,
        Pattern::Pull,
        Pattern::Pub,
        Pattern::Sub,
        Pattern::Req,
        Pattern::Rep,
        Pattern::Router,
        Pattern::Dealer,
        Pattern::XPub,
        Pattern::XSub,
        Pattern::Pair,
        Pattern::Stream,
    ];

    /// Role used by the constructors when an endpoint carries no sigil.
    ///
    /// `None` means the pattern has no inherent direction and every endpoint
    /// must say `@` or `>`.
    pub fn default_direction(self) -> Option<Direction> {
        match self {
            Pattern::Push | Pattern::Pub | Pattern::Rep | Pattern::Router | Pattern::XPub => {
                Some(Direction::Bind)
            }
            Pattern::Pull | Pattern::Sub | Pattern::Req | Pattern::Dealer | Pattern::XSub => {
                Some(Direction::Connect)
            }
            Pattern::Pair | Pattern::Stream => None,
        }
    }

    /// Address-aware patterns prefix every received message with the peer
    /// identity and route outgoing messages by their first frame.
    pub fn is_address_aware(self) -> bool {
        match self {
            Pattern::Router | Pattern::Stream => true,
            Pattern::Push
            | Pattern::Pull
            | Pattern::Pub
            | Pattern::Sub
            | Pattern::Req
            | Pattern::Rep
            | Pattern::Dealer
            | Pattern::XPub
            | Pattern::XSub
            | Pattern::Pair => false,
        }
    }

    pub fn can_send(self) -> bool {
        !matches!(self, Pattern::Pull | Pattern::Sub)
    }

    pub fn can_recv(self) -> bool {
        !matches!(self, Pattern::Push | Pattern::Pub)
    }

    /// Whether a socket of this pattern may be connected to `peer`.
    pub fn is_compatible(self, peer: Pattern) -> bool {
        use Pattern::*;
        match self {
            Push => peer == Pull,
            Pull => peer == Push,
            Pub | XPub => matches!(peer, Sub | XSub),
            Sub | XSub => matches!(peer, Pub | XPub),
            Req => matches!(peer, Rep | Router),
            Rep => matches!(peer, Req | Dealer),
            Dealer => matches!(peer, Rep | Dealer | Router),
            Router => matches!(peer, Req | Dealer | Router),
            Pair => peer == Pair,
            Stream => peer == Stream,
        }
    }

    /// Patterns that filter outbound traffic by subscription.
    pub(crate) fn is_publisher(self) -> bool {
        matches!(self, Pattern::Pub | Pattern::XPub)
    }

    /// Patterns that send subscriptions upstream.
    pub(crate) fn is_subscriber(self) -> bool {
        matches!(self, Pattern::Sub | Pattern::XSub)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pattern::Push => "PUSH",
            Pattern::Pull => "PULL",
            Pattern::Pub => "PUB",
            Pattern::Sub => "SUB",
            Pattern::Req => "REQ",
            Pattern::Rep => "REP",
            Pattern::Router => "ROUTER",
            Pattern::Dealer => "DEALER",
            Pattern::XPub => "XPUB",
            Pattern::XSub => "XSUB",
            Pattern::Pair => "PAIR",
            Pattern::Stream => "STREAM",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown pattern name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown socket pattern '{0}'")]
pub struct UnknownPattern(pub String);

impl FromStr for Pattern {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .into_iter()
            .find(|pattern| pattern.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPattern(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roles_follow_server_client_split() {
        for pattern in [Pattern::Push, Pattern::Pub, Pattern::Rep, Pattern::Router, Pattern::XPub] {
            assert_eq!(pattern.default_direction(), Some(Direction::Bind), "{pattern}");
        }
        for pattern in [Pattern::Pull, Pattern::Sub, Pattern::Req, Pattern::Dealer, Pattern::XSub] {
            assert_eq!(pattern.default_direction(), Some(Direction::Connect), "{pattern}");
        }
        assert_eq!(Pattern::Pair.default_direction(), None);
        assert_eq!(Pattern::Stream.default_direction(), None);
    }

    #[test]
    fn only_router_and_stream_are_address_aware() {
        let aware: Vec<Pattern> = Pattern::ALL
            .into_iter()
            .filter(|p| p.is_address_aware())
            .collect();
        assert_eq!(aware, vec![Pattern::Router, Pattern::Stream]);
    }

    #[test]
    fn compatibility_is_symmetric() {
        for a in Pattern::ALL {
            for b in Pattern::ALL {
                assert_eq!(a.is_compatible(b), b.is_compatible(a), "{a} vs {b}");
            }
        }
        assert!(Pattern::Dealer.is_compatible(Pattern::Router));
        assert!(!Pattern::Push.is_compatible(Pattern::Sub));
    }

    #[test]
    fn parse_and_display_roundtrip() {
        for pattern in Pattern::ALL {
            assert_eq!(pattern.as_str().parse::<Pattern>().unwrap(), pattern);
        }
        assert_eq!("dealer".parse::<Pattern>().unwrap(), Pattern::Dealer);
        assert!("bogus".parse::<Pattern>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let json = serde_json::to_string(&Pattern::XPub).unwrap();
        assert_eq!(json, "\"XPUB\"");
        let back: Pattern = serde_json::from_str("\"ROUTER\"").unwrap();
        assert_eq!(back, Pattern::Router);
    }
}
