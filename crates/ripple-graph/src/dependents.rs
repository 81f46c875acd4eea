use indexmap::IndexMap;
use ripple_core::{DependencyKind, ManifestSnapshot};
use tracing::debug;

/// A package that declares a dependency on another workspace package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dependent {
    pub name: String,
    pub kind: DependencyKind,
}

/// Reverse dependency index: for each package, who depends on it and how.
///
/// Every snapshot package has an entry, in snapshot order. Each dependent
/// list is sorted by name and then kind, so iteration is reproducible.
#[derive(Debug, Clone, Default)]
pub struct DependentIndex {
    dependents: IndexMap<String, Vec<Dependent>>,
}

impl DependentIndex {
    #[must_use]
    pub fn build(snapshot: &ManifestSnapshot) -> Self {
        let mut dependents: IndexMap<String, Vec<Dependent>> = snapshot
            .names()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();

        for package in snapshot.iter() {
            for kind in DependencyKind::ALL {
                for dependency in package.dependencies(kind).keys() {
                    if dependency == &package.name {
                        continue;
                    }
                    // Names outside the snapshot are external packages.
                    let Some(entry) = dependents.get_mut(dependency) else {
                        continue;
                    };
                    entry.push(Dependent {
                        name: package.name.clone(),
                        kind,
                    });
                }
            }
        }

        for list in dependents.values_mut() {
            list.sort();
            list.dedup();
        }

        debug!(
            packages = dependents.len(),
            edges = dependents.values().map(Vec::len).sum::<usize>(),
            "built dependent index"
        );

        Self { dependents }
    }

    /// Dependents of `name`; empty for packages with none or not in the snapshot.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> &[Dependent] {
        self.dependents
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Dependent])> {
        self.dependents
            .iter()
            .map(|(name, list)| (name.as_str(), list.as_slice()))
    }
}
