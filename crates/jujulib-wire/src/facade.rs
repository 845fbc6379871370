//! Facade version table.
//!
//! Each facade the controller exposes is versioned on its own. The login
//! response lists every facade with the versions the server speaks; the table
//! is replaced wholesale on each successful login.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the login response's `facades` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeVersions {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<u32>,
}

/// Mapping from facade name to the versions supported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacadeTable {
    facades: BTreeMap<String, Vec<u32>>,
}

impl FacadeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the versions supported for a facade.
    pub fn insert(&mut self, name: impl Into<String>, versions: Vec<u32>) {
        self.facades.insert(name.into(), versions);
    }

    pub fn versions(&self, name: &str) -> Option<&[u32]> {
        self.facades.get(name).map(Vec::as_slice)
    }

    /// Look up the version to use for `name`.
    ///
    /// With `wanted`, returns it only if the server lists it. Without, returns
    /// the highest listed version. Unknown facades and empty lists yield `None`.
    pub fn find_version(&self, name: &str, wanted: Option<u32>) -> Option<u32> {
        let versions = self.versions(name)?;
        match wanted {
            Some(version) => versions.contains(&version).then_some(version),
            None => versions.iter().copied().max(),
        }
    }

    /// Highest of `candidates` that the server supports for `name`.
    pub fn negotiate(&self, name: &str, candidates: &[u32]) -> Option<u32> {
        candidates
            .iter()
            .copied()
            .filter(|&v| self.find_version(name, Some(v)).is_some())
            .max()
    }

    pub fn len(&self) -> usize {
        self.facades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facades.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.facades
            .iter()
            .map(|(name, versions)| (name.as_str(), versions.as_slice()))
    }
}

impl FromIterator<FacadeVersions> for FacadeTable {
    fn from_iter<I: IntoIterator<Item = FacadeVersions>>(iter: I) -> Self {
        let mut table = Self::new();
        for facade in iter {
            table.insert(facade.name, facade.versions);
        }
        table
    }
}

impl<'a> FromIterator<(&'a str, &'a [u32])> for FacadeTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a [u32])>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, versions) in iter {
            table.insert(name, versions.to_vec());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FacadeTable {
        [("Test", &[0u32, 1][..])].into_iter().collect()
    }

    #[test]
    fn test_returns_version_if_supported() {
        assert_eq!(table().find_version("Test", Some(0)), Some(0));
        assert_eq!(table().find_version("Test", Some(1)), Some(1));
    }

    #[test]
    fn test_returns_highest_version_when_none_requested() {
        assert_eq!(table().find_version("Test", None), Some(1));

        let unordered: FacadeTable = [("Client", &[47u32, 42][..])].into_iter().collect();
        assert_eq!(unordered.find_version("Client", None), Some(47));
    }

    #[test]
    fn test_unsupported_lookups_return_none() {
        let t = table();
        assert_eq!(t.find_version("Test", Some(2)), None);
        assert_eq!(t.find_version("ChangeSet", Some(1)), None);
        assert_eq!(t.find_version("BadWolf", None), None);
        assert_eq!(t.find_version("BadWolf", Some(42)), None);

        let empty: FacadeTable = [("Empty", &[][..])].into_iter().collect();
        assert_eq!(empty.find_version("Empty", None), None);
    }

    #[test]
    fn test_negotiate_picks_highest_common_version() {
        let t: FacadeTable = [("ModelManager", &[2u32, 3, 4][..])].into_iter().collect();
        assert_eq!(t.negotiate("ModelManager", &[2, 3]), Some(3));
        assert_eq!(t.negotiate("ModelManager", &[5]), None);
        assert_eq!(t.negotiate("Cloud", &[1]), None);
    }

    #[test]
    fn test_from_login_facades() {
        let table: FacadeTable = vec![
            FacadeVersions {
                name: "Client".to_string(),
                versions: vec![42, 47],
            },
            FacadeVersions {
                name: "ModelManager".to_string(),
                versions: vec![2],
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.versions("Client"), Some(&[42, 47][..]));
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            serde_json::json!({"Client": [42, 47], "ModelManager": [2]})
        );
    }
}
