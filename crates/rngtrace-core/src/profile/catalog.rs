use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::profile::TargetProfile;

/// Immutable lookup from content hash to target profile.
///
/// Built once at startup from the built-in profiles plus any loaded from
/// profile files.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: HashMap<String, TargetProfile>,
}

impl ProfileCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog containing every built-in profile
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        let profile = TargetProfile::slpm_87224();
        catalog.profiles.insert(normalize(&profile.hash), profile);
        catalog
    }

    /// Add a profile, replacing any built-in with the same hash
    pub fn with_profile(mut self, profile: TargetProfile) -> Result<Self> {
        profile.validate()?;
        let key = normalize(&profile.hash);
        if key.is_empty() {
            return Err(Error::InvalidProfile("profile hash is empty".to_string()));
        }
        if self.profiles.contains_key(&key) {
            debug!("Overriding profile {}", key);
        }
        self.profiles.insert(key, profile);
        Ok(self)
    }

    /// Look up a profile by hash (case-insensitive)
    pub fn get(&self, hash: &str) -> Option<&TargetProfile> {
        self.profiles.get(&normalize(hash))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Profiles ordered by hash
    pub fn iter(&self) -> impl Iterator<Item = &TargetProfile> {
        let mut profiles: Vec<_> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.hash.cmp(&b.hash));
        profiles.into_iter()
    }
}

fn normalize(hash: &str) -> String {
    hash.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = ProfileCatalog::builtin();
        assert_eq!(catalog.len(), 1);

        let profile = catalog.get("B37AB196").unwrap();
        assert_eq!(profile.name, "SLPM-87224");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = ProfileCatalog::builtin();
        assert!(catalog.get("b37ab196").is_some());
        assert!(catalog.get(" B37AB196 ").is_some());
    }

    #[test]
    fn test_unknown_hash() {
        let catalog = ProfileCatalog::builtin();
        assert!(catalog.get("DEADBEEF").is_none());
    }

    #[test]
    fn test_with_profile_overrides() {
        let mut custom = TargetProfile::slpm_87224();
        custom.name = "patched".to_string();

        let catalog = ProfileCatalog::builtin().with_profile(custom).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("B37AB196").unwrap().name, "patched");
    }

    #[test]
    fn test_with_profile_rejects_invalid() {
        let mut custom = TargetProfile::slpm_87224();
        custom.patch_bytes.clear();

        assert!(ProfileCatalog::new().with_profile(custom).is_err());
    }

    #[test]
    fn test_iter_sorted_by_hash() {
        let mut other = TargetProfile::slpm_87224();
        other.hash = "00000001".to_string();

        let catalog = ProfileCatalog::builtin().with_profile(other).unwrap();
        let hashes: Vec<_> = catalog.iter().map(|p| p.hash.as_str()).collect();
        assert_eq!(hashes, vec!["00000001", "B37AB196"]);
    }
}
