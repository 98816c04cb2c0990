use serde::{Deserialize, Serialize};

/// A 20-byte account or contract identifier.
///
/// [`Address::ZERO`] is never a valid recipient, fee collector or owner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Derive a deterministic address from a label.
    ///
    /// The same label always yields the same address; the label is hashed
    /// with a domain separation tag and truncated to 20 bytes.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"basket-address-v1:");
        hasher.update(label.as_bytes());
        Self::from_hash(hasher.finalize())
    }

    /// Derive a child address from a parent address, a purpose tag and a nonce.
    ///
    /// Used when one contract creates another (the factory deriving the
    /// controller and ledger of a new basket).
    pub fn derive_child(parent: &Address, purpose: &str, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"basket-child-v1:");
        hasher.update(&parent.0);
        hasher.update(b":");
        hasher.update(purpose.as_bytes());
        hasher.update(b":");
        hasher.update(&nonce.to_le_bytes());
        Self::from_hash(hasher.finalize())
    }

    fn from_hash(hash: blake3::Hash) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Short display form (first 4 bytes hex).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(raw, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Symbolic token code such as "WETH" or "WBTC".
///
/// An asset resolves to a deployed token contract when the host's token bank
/// lists it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
