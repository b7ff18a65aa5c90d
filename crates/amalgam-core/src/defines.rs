//! Define hoisting.
//!
//! Build systems tend to pass the same handful of project-wide macros to
//! every translation unit. Those are hoisted out of the per-unit
//! `#define`/`#undef` bracketing and passed once on the amalgamated unit's
//! command line instead.

use crate::unit::{DefineFlag, NormalizedUnit};
use indexmap::IndexSet;

/// Define flags shared, byte for byte, by every unit.
///
/// Equality is on the whole flag string, so `-DLEVEL=1` in one unit and
/// `-DLEVEL=2` in another are never hoisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonDefineSet {
    flags: IndexSet<String>,
}

impl CommonDefineSet {
    /// Compute the set over `units`, in the order the first unit lists them.
    pub fn hoist(units: &[NormalizedUnit]) -> Self {
        let Some((first, rest)) = units.split_first() else {
            return Self::default();
        };

        let others: Vec<IndexSet<&str>> = rest
            .iter()
            .map(|unit| unit.define_flags.iter().map(|d| d.flag.as_str()).collect())
            .collect();

        let flags = first
            .define_flags
            .iter()
            .map(|d| d.flag.as_str())
            .filter(|flag| others.iter().all(|set| set.contains(flag)))
            .map(str::to_string)
            .collect();

        Self { flags }
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// The defines a unit still has to bracket locally.
    pub fn local_defines<'a>(
        &'a self,
        unit: &'a NormalizedUnit,
    ) -> impl Iterator<Item = &'a DefineFlag> + 'a {
        unit.define_flags
            .iter()
            .filter(move |define| !self.contains(&define.flag))
    }
}

impl<S: Into<String>> FromIterator<S> for CommonDefineSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn unit(path: &str, flags: &[&str]) -> Result<NormalizedUnit, CoreError> {
        NormalizedUnit::new(
            PathBuf::from(format!("/p/{}", path)),
            path,
            flags.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_hoist_common_defines() -> Result<(), CoreError> {
        let units = vec![
            unit("x.c", &["-DANS=1", "-DFOO=1"])?,
            unit("y.c", &["-DANS=1", "-DBAR=2"])?,
        ];
        let common = CommonDefineSet::hoist(&units);

        assert_eq!(common.iter().collect::<Vec<_>>(), vec!["-DANS=1"]);
        let local: Vec<_> = common.local_defines(&units[0]).map(|d| d.flag.as_str()).collect();
        assert_eq!(local, vec!["-DFOO=1"]);
        Ok(())
    }

    #[test]
    fn test_same_name_different_value_is_not_hoisted() -> Result<(), CoreError> {
        let units = vec![
            unit("a.c", &["-DLEVEL=1", "-DSHARED"])?,
            unit("b.c", &["-DSHARED", "-DLEVEL=2"])?,
        ];
        let common = CommonDefineSet::hoist(&units);

        assert!(common.contains("-DSHARED"));
        assert!(!common.contains("-DLEVEL=1"));
        assert!(!common.contains("-DLEVEL=2"));
        assert_eq!(common.local_defines(&units[1]).count(), 1);
        Ok(())
    }

    #[test]
    fn test_hoist_edge_cases() -> Result<(), CoreError> {
        assert!(CommonDefineSet::hoist(&[]).is_empty());

        // A single unit shares everything with itself.
        let single = vec![unit("a.c", &["-DA", "-DB=2"])?];
        assert_eq!(CommonDefineSet::hoist(&single).len(), 2);

        // Repeating a define inside one unit does not make it common.
        let repeated = vec![unit("a.c", &["-DA", "-DA"])?, unit("b.c", &["-DB"])?];
        assert!(CommonDefineSet::hoist(&repeated).is_empty());
        Ok(())
    }
}
