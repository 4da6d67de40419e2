use bytes::{BufMut, Bytes, BytesMut};

/// Leading byte of a subscribe request.
pub const SUBSCRIBE: u8 = 0x01;
/// Leading byte of a cancel request.
pub const CANCEL: u8 = 0x00;

/// A subscription change travelling from a subscriber to a publisher.
///
/// On the wire (and as the messages an XPUB socket receives) this is one
/// byte, `0x01` or `0x00`, followed by the topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    Subscribe(Bytes),
    Cancel(Bytes),
}

impl Subscription {
    pub fn topic(&self) -> &Bytes {
        match self {
            Subscription::Subscribe(topic) | Subscription::Cancel(topic) => topic,
        }
    }

    pub fn encode(&self) -> Bytes {
        let (tag, topic) = match self {
            Subscription::Subscribe(topic) => (SUBSCRIBE, topic),
            Subscription::Cancel(topic) => (CANCEL, topic),
        };
        let mut buf = BytesMut::with_capacity(1 + topic.len());
        buf.put_u8(tag);
        buf.extend_from_slice(topic);
        buf.freeze()
    }

    /// Parse a subscription message. Anything that does not start with a
    /// known tag is not a subscription.
    pub fn decode(payload: &Bytes) -> Option<Self> {
        let topic = payload.slice(1.min(payload.len())..);
        match payload.first() {
            Some(&SUBSCRIBE) => Some(Subscription::Subscribe(topic)),
            Some(&CANCEL) => Some(Subscription::Cancel(topic)),
            _ => None,
        }
    }
}

/// Topics a peer has asked for. Duplicates are counted, so a topic stays
/// active until it has been cancelled as often as it was subscribed.
#[derive(Debug, Default)]
pub(crate) struct TopicSet {
    topics: Vec<Bytes>,
}

impl TopicSet {
    pub(crate) fn apply(&mut self, change: &Subscription) {
        match change {
            Subscription::Subscribe(topic) => self.topics.push(topic.clone()),
            Subscription::Cancel(topic) => {
                if let Some(index) = self.topics.iter().position(|t| t == topic) {
                    self.topics.swap_remove(index);
                }
            }
        }
    }

    /// True when some topic is a prefix of `first_frame`. The empty topic
    /// matches everything.
    pub(crate) fn matches(&self, first_frame: &[u8]) -> bool {
        self.topics
            .iter()
            .any(|topic| first_frame.starts_with(topic))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.topics.iter()
    }
}
