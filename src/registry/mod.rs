//! Named catalogues of metrics and null models.
//!
//! The rest of the pipeline is generic over "whatever was requested": callers
//! hand a subset of names (or nothing, meaning everything) and get the
//! resolved ordered callables back. The one hard invariant lives here, not at
//! call sites: the metric selection always contains `richness`, and always
//! first, so every downstream table has the grouping column in a known place.

use crate::error::{PhyloError, Result};
use crate::metric::builtin::{
    metric_mntd, metric_mpd, metric_mpd_abund, metric_pd, metric_richness,
};
use crate::metric::MetricContext;
use crate::null::models::{
    null_frequency, null_independent_swap, null_regional, null_richness,
};
use crate::null::{NullContext, NullParams};
use crate::data::{CommunityMatrix, RICHNESS};

/// Per-row metric contract: one scalar per (quadrat, metric), NaN where the
/// row cannot support the metric.
pub type MetricFn = fn(&MetricContext, usize) -> f64;

/// Null transform contract: one randomized matrix per invocation.
pub type NullFn = fn(&NullContext, &NullParams) -> Result<CommunityMatrix>;

/// A registered metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricEntry {
    pub name: &'static str,
    /// Whether the metric requires a phylogenetic tree in the context.
    pub needs_tree: bool,
    pub func: MetricFn,
}

/// A registered null model.
#[derive(Debug, Clone, Copy)]
pub struct NullEntry {
    pub name: &'static str,
    pub func: NullFn,
}

/// Ordered catalogue of available metrics.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    entries: Vec<MetricEntry>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MetricRegistry {
    /// The built-in catalogue: richness plus the standard tree-based metrics.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                MetricEntry {
                    name: RICHNESS,
                    needs_tree: false,
                    func: metric_richness,
                },
                MetricEntry {
                    name: "mpd",
                    needs_tree: true,
                    func: metric_mpd,
                },
                MetricEntry {
                    name: "mntd",
                    needs_tree: true,
                    func: metric_mntd,
                },
                MetricEntry {
                    name: "pd",
                    needs_tree: true,
                    func: metric_pd,
                },
                MetricEntry {
                    name: "mpd_abund",
                    needs_tree: true,
                    func: metric_mpd_abund,
                },
            ],
        }
    }

    /// Names of every registered metric, in catalogue order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Resolve a requested subset into ordered entries.
    ///
    /// `None` selects the full catalogue. `richness` is always present and
    /// always first, whether or not it was requested; duplicates collapse;
    /// an unknown name fails with `UnknownMetric` carrying that name.
    pub fn resolve(&self, subset: Option<&[String]>) -> Result<Vec<MetricEntry>> {
        let richness = self.entries[0];
        debug_assert_eq!(richness.name, RICHNESS);

        let requested: Vec<&str> = match subset {
            None => return Ok(self.entries.clone()),
            Some(names) => names.iter().map(|s| s.as_str()).collect(),
        };

        let mut selected = vec![richness];
        for name in requested {
            if name == RICHNESS {
                continue;
            }
            let entry = self
                .entries
                .iter()
                .find(|e| e.name == name)
                .ok_or_else(|| PhyloError::UnknownMetric(name.to_string()))?;
            if selected.iter().all(|e| e.name != name) {
                selected.push(*entry);
            }
        }
        Ok(selected)
    }
}

/// Ordered catalogue of available null models.
#[derive(Debug, Clone)]
pub struct NullRegistry {
    entries: Vec<NullEntry>,
}

impl Default for NullRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NullRegistry {
    /// The built-in catalogue of randomization schemes.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                NullEntry {
                    name: "richness",
                    func: null_richness,
                },
                NullEntry {
                    name: "frequency",
                    func: null_frequency,
                },
                NullEntry {
                    name: "regional",
                    func: null_regional,
                },
                NullEntry {
                    name: "independent_swap",
                    func: null_independent_swap,
                },
            ],
        }
    }

    /// Names of every registered null model, in catalogue order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Resolve a requested subset into ordered entries. `None` selects the
    /// full catalogue; duplicates collapse; an unknown name fails with
    /// `UnknownNull` carrying that name.
    pub fn resolve(&self, subset: Option<&[String]>) -> Result<Vec<NullEntry>> {
        let requested: Vec<&str> = match subset {
            None => return Ok(self.entries.clone()),
            Some(names) => names.iter().map(|s| s.as_str()).collect(),
        };
        let mut selected: Vec<NullEntry> = Vec::new();
        for name in requested {
            let entry = self
                .entries
                .iter()
                .find(|e| e.name == name)
                .ok_or_else(|| PhyloError::UnknownNull(name.to_string()))?;
            if selected.iter().all(|e| e.name != name) {
                selected.push(*entry);
            }
        }
        if selected.is_empty() {
            return Err(PhyloError::EmptyData(
                "no null models selected".to_string(),
            ));
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_of(entries: &[MetricEntry]) -> Vec<&'static str> {
        entries.iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_full_catalogue_has_richness_first() {
        let registry = MetricRegistry::builtin();
        let entries = registry.resolve(None).unwrap();
        assert_eq!(entries[0].name, RICHNESS);
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_subset_keeps_richness_first() {
        let registry = MetricRegistry::builtin();
        let entries = registry
            .resolve(Some(&["mpd".to_string(), "pd".to_string()]))
            .unwrap();
        assert_eq!(names_of(&entries), vec![RICHNESS, "mpd", "pd"]);
    }

    #[test]
    fn test_empty_subset_yields_just_richness() {
        let registry = MetricRegistry::builtin();
        let entries = registry.resolve(Some(&[])).unwrap();
        assert_eq!(names_of(&entries), vec![RICHNESS]);
    }

    #[test]
    fn test_explicit_richness_not_duplicated() {
        let registry = MetricRegistry::builtin();
        let entries = registry
            .resolve(Some(&[
                RICHNESS.to_string(),
                "mpd".to_string(),
                "mpd".to_string(),
            ]))
            .unwrap();
        assert_eq!(names_of(&entries), vec![RICHNESS, "mpd"]);
    }

    #[test]
    fn test_unknown_metric_carries_the_name() {
        let registry = MetricRegistry::builtin();
        match registry.resolve(Some(&["nonsense".to_string()])) {
            Err(PhyloError::UnknownMetric(name)) => assert_eq!(name, "nonsense"),
            other => panic!("expected UnknownMetric, got {:?}", other),
        }
    }

    #[test]
    fn test_null_registry_resolution() {
        let registry = NullRegistry::builtin();
        assert_eq!(registry.resolve(None).unwrap().len(), 4);
        let one = registry.resolve(Some(&["regional".to_string()])).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].name, "regional");
        assert!(matches!(
            registry.resolve(Some(&["bogus".to_string()])),
            Err(PhyloError::UnknownNull(_))
        ));
        assert!(registry.resolve(Some(&[])).is_err());
    }
}
