//! PersonaId - Cheap-to-clone persona identifier
//!
//! Persona ids are minted once by the persona stage and then copied into
//! every résumé, batch, prompt and run record. `Arc<str>` keeps those copies
//! O(1).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Persona identifier with cheap cloning.
///
/// # Examples
/// ```
/// use contracts::PersonaId;
///
/// let id = PersonaId::numbered(4);
/// assert_eq!(id, "pers_004");
/// assert_eq!(id.ordinal(), Some(4));
/// ```
#[derive(Clone, Default)]
pub struct PersonaId(Arc<str>);

impl PersonaId {
    /// Create a new PersonaId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Canonical id for the `n`-th generated persona (1-based), e.g. `pers_007`.
    pub fn numbered(n: usize) -> Self {
        Self(Arc::from(format!("pers_{n:03}")))
    }

    /// Numeric suffix of a canonical id.
    pub fn ordinal(&self) -> Option<usize> {
        self.0.strip_prefix("pers_")?.parse().ok()
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for PersonaId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PersonaId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PersonaId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PersonaId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for PersonaId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersonaId({:?})", self.0)
    }
}

impl PartialEq for PersonaId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for PersonaId {}

impl PartialEq<str> for PersonaId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for PersonaId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialOrd for PersonaId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PersonaId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

// Must agree with `str` hashing so `HashMap<PersonaId, _>` can be queried by `&str`.
impl Hash for PersonaId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for PersonaId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PersonaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
