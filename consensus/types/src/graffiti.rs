use serde_derive::{Deserialize, Serialize};
use std::fmt;

pub const GRAFFITI_BYTES_LEN: usize = 32;

/// The graffiti inserted into blocks proposed by this node.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graffiti(pub [u8; GRAFFITI_BYTES_LEN]);

impl Graffiti {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Graffiti {
    /// Truncates UTF-8 input to the fixed graffiti length.
    fn from(s: &str) -> Self {
        let mut bytes = [0u8; GRAFFITI_BYTES_LEN];
        let len = std::cmp::min(s.len(), GRAFFITI_BYTES_LEN);
        bytes[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self(bytes)
    }
}

impl fmt::Debug for Graffiti {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let trimmed: Vec<u8> = self
            .0
            .iter()
            .copied()
            .take_while(|byte| *byte != 0)
            .collect();
        write!(f, "{}", String::from_utf8_lossy(&trimmed))
    }
}
