use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Native ids live below this bound; synthesized ones stay there too.
const PARA_ID_LIMIT: u32 = 0x8000_0000;

/// Hands out unique 8-hex-digit paragraph identifiers for one document.
#[derive(Debug, Default)]
pub struct ParaIdAllocator {
    /// Native ids present anywhere in the document; never handed to synthesized blocks.
    reserved: HashSet<u32>,
    claimed: HashSet<u32>,
}

/// Result of claiming an id for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParaIdClaim {
    Native(String),
    Synthesized(String),
    /// The native id was already claimed by an earlier block; a fresh one was synthesized.
    Duplicate { native: String, assigned: String },
}

impl ParaIdClaim {
    pub fn id(&self) -> &str {
        match self {
            Self::Native(id) | Self::Synthesized(id) => id,
            Self::Duplicate { assigned, .. } => assigned,
        }
    }
}

impl ParaIdAllocator {
    pub fn with_reserved<'a>(native_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            reserved: native_ids.into_iter().filter_map(parse_hex).collect(),
            claimed: HashSet::new(),
        }
    }

    pub fn claim(&mut self, native: Option<&str>, position: usize, text: &str) -> ParaIdClaim {
        match native.map(|raw| (raw, parse_hex(raw))) {
            Some((_, Some(value))) if self.claimed.insert(value) => {
                ParaIdClaim::Native(format!("{value:08X}"))
            }
            Some((raw, Some(_))) => ParaIdClaim::Duplicate {
                native: raw.to_ascii_uppercase(),
                assigned: self.synthesize(position, text),
            },
            _ => ParaIdClaim::Synthesized(self.synthesize(position, text)),
        }
    }

    fn synthesize(&mut self, position: usize, text: &str) -> String {
        let digest = Sha256::digest(format!("{position}:{text}").as_bytes());
        let mut candidate =
            u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) % PARA_ID_LIMIT;
        while self.reserved.contains(&candidate) || !self.claimed.insert(candidate) {
            candidate = (candidate + 1) % PARA_ID_LIMIT;
        }
        format!("{candidate:08X}")
    }
}

fn parse_hex(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.len() != 8 {
        return None;
    }
    u32::from_str_radix(raw, 16).ok().filter(|v| *v < PARA_ID_LIMIT)
}
