use std::{fmt, str::FromStr};

/// The longest id a principal may carry.
const MAX_LENGTH: usize = 29;
const CHECKSUM_LENGTH: usize = 4;
const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const GROUP_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("Principal id is {0} bytes long, the maximum is 29")]
    TooLong(usize),
    #[error("Invalid character '{0}' in textual principal")]
    InvalidCharacter(char),
    #[error("Textual principal is too short to hold a checksum")]
    TooShort,
    #[error("Checksum mismatch, expected '{expected}' but the text encodes '{found}'")]
    ChecksumMismatch { expected: String, found: String },
    #[error("Textual principal is not in canonical form, expected '{0}'")]
    NotCanonical(String),
}

/// An opaque identity: a canister, a user or the management canister.
///
/// The textual form is the lowercase base32 encoding of a big-endian CRC32 checksum
/// followed by the id bytes, split in dash-separated groups of five characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal(Vec<u8>);

impl Principal {
    /// The management canister, `aaaaa-aa`.
    pub fn management_canister() -> Self {
        Self(Vec::new())
    }

    /// The anonymous identity, `2vxsx-fae`.
    pub fn anonymous() -> Self {
        Self(vec![0x04])
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalError> {
        if bytes.len() > MAX_LENGTH {
            return Err(PrincipalError::TooLong(bytes.len()));
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let normalized: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let decoded = base32_decode(&normalized)?;
        if decoded.len() < CHECKSUM_LENGTH {
            return Err(PrincipalError::TooShort);
        }

        let (checksum, bytes) = decoded.split_at(CHECKSUM_LENGTH);
        let principal = Self::from_slice(bytes)?;
        let expected = crc32fast::hash(bytes).to_be_bytes();
        if checksum != expected {
            return Err(PrincipalError::ChecksumMismatch {
                expected: hex_string(&expected),
                found: hex_string(checksum),
            });
        }

        let canonical = principal.to_text();
        if canonical != text.to_ascii_lowercase() {
            return Err(PrincipalError::NotCanonical(canonical));
        }
        Ok(principal)
    }

    pub fn to_text(&self) -> String {
        let mut payload = Vec::with_capacity(CHECKSUM_LENGTH + self.0.len());
        payload.extend_from_slice(&crc32fast::hash(&self.0).to_be_bytes());
        payload.extend_from_slice(&self.0);

        let encoded = base32_encode(&payload);
        let mut out = String::with_capacity(encoded.len() + encoded.len() / GROUP_SIZE);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % GROUP_SIZE == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Result<Vec<u8>, PrincipalError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for c in text.chars() {
        let value = ALPHABET
            .iter()
            .position(|a| *a as char == c)
            .ok_or(PrincipalError::InvalidCharacter(c))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Ok(out)
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
