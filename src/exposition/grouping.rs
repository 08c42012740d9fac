//! Label-set grouping for distribution families
//!
//! Splits a family's flat rows into one group per distinct label set, with
//! the particle label (`quantile`/`le`) removed from bucket and quantile rows.
//!
//! Keys compare positionally: `[a=1, b=2]` and `[b=2, a=1]` are different
//! groups. Groups come back in first-insertion order.

use ahash::AHashMap;
use tracing::trace;

use super::accumulator::{truncate_count, DistributionKind, ParticleAccumulator};
use super::error::{ensure_paired, FormatError};
use super::float::decode_label_float;
use crate::metrics::{MetricFamilySamples, Sample};

const COUNT_SUFFIX: &str = "_count";
const SUM_SUFFIX: &str = "_sum";

/// Positional label set identifying one output series
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LabelKey {
    names: Vec<String>,
    values: Vec<String>,
}

impl LabelKey {
    pub fn new(names: Vec<String>, values: Vec<String>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        LabelKey { names, values }
    }

    /// Full label set of a sample
    pub fn of(sample: &Sample) -> Self {
        LabelKey::new(sample.label_names.clone(), sample.label_values.clone())
    }

    /// Label set of a sample with the entry at `index` removed
    pub fn without(sample: &Sample, index: usize) -> Self {
        let mut names = sample.label_names.clone();
        let mut values = sample.label_values.clone();
        names.remove(index);
        values.remove(index);
        LabelKey::new(names, values)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// One label set and what was accumulated for it
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: LabelKey,
    pub accumulator: ParticleAccumulator,
}

/// Groups of one family, in first-insertion order
#[derive(Debug)]
pub struct LabelGroups {
    kind: DistributionKind,
    groups: Vec<Group>,
    index: AHashMap<LabelKey, usize>,
    skipped: usize,
}

impl LabelGroups {
    pub fn new(kind: DistributionKind) -> Self {
        LabelGroups {
            kind,
            groups: Vec::new(),
            index: AHashMap::new(),
            skipped: 0,
        }
    }

    /// Single pass over a family's samples
    ///
    /// Rows lacking the particle label are dropped. A particle label value
    /// that does not decode as a float fails the whole family.
    pub fn collect(family: &MetricFamilySamples, kind: DistributionKind) -> Result<Self, FormatError> {
        let mut groups = LabelGroups::new(kind);
        for sample in &family.samples {
            groups.consume(&family.name, sample)?;
        }
        Ok(groups)
    }

    /// Route one sample to its group's accumulator
    pub fn consume(&mut self, family: &str, sample: &Sample) -> Result<(), FormatError> {
        ensure_paired(family, sample)?;
        if sample.name.ends_with(COUNT_SUFFIX) {
            self.entry(LabelKey::of(sample))
                .consume_sample_count(truncate_count(sample.value));
            return Ok(());
        }
        if sample.name.ends_with(SUM_SUFFIX) {
            self.entry(LabelKey::of(sample))
                .consume_sample_sum(sample.value);
            return Ok(());
        }

        let label = self.kind.particle_label();
        let Some(position) = sample.label_names.iter().position(|n| n == label) else {
            trace!(family, sample = %sample.name, label, "dropping row without particle label");
            self.skipped += 1;
            return Ok(());
        };

        let raw = &sample.label_values[position];
        let boundary = decode_label_float(raw).map_err(|source| FormatError::InvalidParticle {
            family: family.to_string(),
            label,
            value: raw.clone(),
            source,
        })?;

        self.entry(LabelKey::without(sample, position))
            .consume_particle(boundary, sample.value);
        Ok(())
    }

    fn entry(&mut self, key: LabelKey) -> &mut ParticleAccumulator {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.index.insert(key.clone(), slot);
                self.groups.push(Group {
                    key,
                    accumulator: ParticleAccumulator::new(self.kind),
                });
                slot
            }
        };
        &mut self.groups[slot].accumulator
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of particle rows dropped for lacking the particle label
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, key: &LabelKey) -> Option<&ParticleAccumulator> {
        self.index.get(key).map(|&slot| &self.groups[slot].accumulator)
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricType;

    fn key(pairs: &[(&str, &str)]) -> LabelKey {
        LabelKey::new(
            pairs.iter().map(|(n, _)| n.to_string()).collect(),
            pairs.iter().map(|(_, v)| v.to_string()).collect(),
        )
    }

    #[test]
    fn test_particle_label_is_stripped() {
        let mut family = MetricFamilySamples::new("lat", MetricType::Histogram, "");
        family.push("lat_bucket", &[("le", "0.5"), ("region", "us")], 3.0);

        let groups = LabelGroups::collect(&family, DistributionKind::Histogram).unwrap();
        assert_eq!(groups.len(), 1);

        let group = &groups.groups()[0];
        assert_eq!(group.key, key(&[("region", "us")]));
        assert_eq!(group.accumulator.particles(), &[(0.5, 3.0)]);
    }

    #[test]
    fn test_count_sum_and_particles_meet() {
        let mut family = MetricFamilySamples::new("rpc", MetricType::Summary, "");
        family.push("rpc", &[("svc", "a"), ("quantile", "0.5")], 0.2);
        family.push("rpc", &[("svc", "a"), ("quantile", "0.9")], 0.7);
        family.push("rpc_count", &[("svc", "a")], 10.0);
        family.push("rpc_sum", &[("svc", "a")], 4.2);

        let groups = LabelGroups::collect(&family, DistributionKind::Summary).unwrap();
        assert_eq!(groups.len(), 1);

        let acc = groups.get(&key(&[("svc", "a")])).unwrap();
        assert_eq!(acc.sample_count(), Some(10));
        assert_eq!(acc.sample_sum(), Some(4.2));
        assert_eq!(acc.particles().len(), 2);
    }

    #[test]
    fn test_keys_are_positional() {
        let mut family = MetricFamilySamples::new("lat", MetricType::Histogram, "");
        family.push("lat_count", &[("a", "1"), ("b", "2")], 1.0);
        family.push("lat_count", &[("b", "2"), ("a", "1")], 2.0);

        let groups = LabelGroups::collect(&family, DistributionKind::Histogram).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_values_distinguish_groups() {
        let mut family = MetricFamilySamples::new("lat", MetricType::Histogram, "");
        family.push("lat_bucket", &[("host", "a"), ("le", "1")], 1.0);
        family.push("lat_bucket", &[("host", "b"), ("le", "1")], 2.0);

        let groups = LabelGroups::collect(&family, DistributionKind::Histogram).unwrap();
        let keys: Vec<_> = groups.groups().iter().map(|g| g.key.clone()).collect();
        assert_eq!(keys, vec![key(&[("host", "a")]), key(&[("host", "b")])]);
    }

    #[test]
    fn test_missing_particle_label_is_skipped() {
        let mut family = MetricFamilySamples::new("rpc", MetricType::Summary, "");
        family.push("rpc_count", &[("svc", "a")], 3.0);
        family.push("rpc", &[("svc", "a")], 99.0);
        family.push("rpc_sum", &[("svc", "a")], 1.0);

        let groups = LabelGroups::collect(&family, DistributionKind::Summary).unwrap();
        assert_eq!(groups.skipped(), 1);
        assert_eq!(groups.len(), 1);

        let acc = groups.get(&key(&[("svc", "a")])).unwrap();
        assert_eq!(acc.sample_count(), Some(3));
        assert_eq!(acc.sample_sum(), Some(1.0));
        assert!(acc.particles().is_empty());
    }

    #[test]
    fn test_bad_particle_value_fails_family() {
        let mut family = MetricFamilySamples::new("lat", MetricType::Histogram, "");
        family.push("lat_bucket", &[("le", "soon")], 1.0);

        let err = LabelGroups::collect(&family, DistributionKind::Histogram).unwrap_err();
        match err {
            FormatError::InvalidParticle { family, label, value, .. } => {
                assert_eq!(family, "lat");
                assert_eq!(label, "le");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unpaired_sample_fails_family() {
        let mut family = MetricFamilySamples::new("lat", MetricType::Histogram, "");
        family.push("lat_count", &[("host", "a")], 1.0);
        family.samples.push(Sample {
            name: "lat_bucket".to_string(),
            label_names: vec!["le".to_string()],
            label_values: vec![],
            value: 1.0,
        });

        let err = LabelGroups::collect(&family, DistributionKind::Histogram).unwrap_err();
        assert!(matches!(err, FormatError::UnpairedLabels { names: 1, values: 0, .. }));
    }

    #[test]
    fn test_summary_ignores_le_label() {
        let mut family = MetricFamilySamples::new("rpc", MetricType::Summary, "");
        family.push("rpc", &[("le", "0.5")], 1.0);

        let groups = LabelGroups::collect(&family, DistributionKind::Summary).unwrap();
        assert!(groups.is_empty());
        assert_eq!(groups.skipped(), 1);
    }

    #[test]
    fn test_empty_family_has_no_groups() {
        let family = MetricFamilySamples::new("lat", MetricType::Histogram, "");
        let groups = LabelGroups::collect(&family, DistributionKind::Histogram).unwrap();
        assert!(groups.is_empty());
    }
}
