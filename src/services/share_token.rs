//! Share-link token codec.
//!
//! # Token Layout
//! ```text
//! cccccccc uuuuuuuu bbbbbbbbbbbbbbbb[...]
//! context  user     base token (16..=32 hex chars)
//! ```
//!
//! # Design Decisions
//! - Ids are fixed-width lowercase hex so the token stays URL-path safe
//! - Decoding accepts either hex case
//! - Minting the base token belongs to the sharing subsystem

use std::fmt;

use crate::services::{ShareTarget, ShareTokenCodec, ShareTokenError};

const ID_WIDTH: usize = 8;
const MIN_BASE: usize = 16;
const MAX_BASE: usize = 32;

/// A share token with its decoded parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareToken {
    pub context_id: u32,
    pub user_id: u32,
    base: String,
}

impl ShareToken {
    /// Assemble a token from its parts. The base must be 16 to 32 hex chars.
    pub fn new(context_id: u32, user_id: u32, base: impl Into<String>) -> Result<Self, ShareTokenError> {
        let base = base.into();
        if !(MIN_BASE..=MAX_BASE).contains(&base.len()) {
            return Err(ShareTokenError::Length(2 * ID_WIDTH + base.len()));
        }
        if !base.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ShareTokenError::NotHex);
        }
        Ok(Self {
            context_id,
            user_id,
            base: base.to_ascii_lowercase(),
        })
    }

    /// Parse a token string.
    pub fn parse(token: &str) -> Result<Self, ShareTokenError> {
        let len = token.len();
        if !(2 * ID_WIDTH + MIN_BASE..=2 * ID_WIDTH + MAX_BASE).contains(&len) {
            return Err(ShareTokenError::Length(len));
        }
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ShareTokenError::NotHex);
        }

        // All bytes are ASCII hex, so slicing at fixed offsets is safe.
        let context_id = u32::from_str_radix(&token[..ID_WIDTH], 16)
            .map_err(|_| ShareTokenError::NotHex)?;
        let user_id = u32::from_str_radix(&token[ID_WIDTH..2 * ID_WIDTH], 16)
            .map_err(|_| ShareTokenError::NotHex)?;
        Self::new(context_id, user_id, &token[2 * ID_WIDTH..])
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}{:08x}{}", self.context_id, self.user_id, self.base)
    }
}

/// Codec for [`ShareToken`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexShareTokenCodec;

impl ShareTokenCodec for HexShareTokenCodec {
    fn decode_share_token(&self, token: &str) -> Result<ShareTarget, ShareTokenError> {
        let parsed = ShareToken::parse(token)?;
        Ok(ShareTarget {
            context_id: parsed.context_id,
            user_id: parsed.user_id,
        })
    }
}
