//! Time-axis alignment between two bar collections.
//!
//! A [`Synchronizer`] maps every index of a reference time axis to an index
//! in a secondary collection, so the secondary data can be read as if it had
//! the reference timestamps. Timestamps missing from the secondary
//! collection are forward-filled from the last exact match.

use crate::domain::error::{Result, SimtraderError};
use crate::domain::identity::{Identifiable, Identity};
use chrono::NaiveDate;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct Synchronizer {
    id: Identity,
    mapping: Vec<usize>,
    times: Vec<NaiveDate>,
    modified: bool,
}

impl Synchronizer {
    /// Aligns `secondary` to `reference` in one forward pass.
    ///
    /// Both time axes must be sorted ascending. `secondary` must not be
    /// empty. A reference timestamp that precedes every exact match maps to
    /// secondary index 0.
    pub fn create(
        reference_id: &Identity,
        reference: &[NaiveDate],
        secondary_id: &Identity,
        secondary: &[NaiveDate],
    ) -> Result<Self> {
        let last = secondary
            .len()
            .checked_sub(1)
            .ok_or(SimtraderError::EmptySecondary)?;

        let mut mapping = Vec::with_capacity(reference.len());
        let mut modified = false;
        let mut last_matched: Option<usize> = None;
        let mut i = 0;
        let mut j = 0;

        while i < reference.len() {
            match reference[i].cmp(&secondary[j]) {
                Ordering::Equal => {
                    mapping.push(j);
                    last_matched = Some(j);
                    i += 1;
                    if j < last {
                        j += 1;
                    }
                }
                Ordering::Greater if j < last => j += 1,
                Ordering::Greater | Ordering::Less => {
                    mapping.push(last_matched.unwrap_or(0));
                    modified = true;
                    i += 1;
                }
            }
        }

        Ok(Self {
            id: Identity::derive("SYNC", &[reference_id, secondary_id]),
            mapping,
            times: reference.to_vec(),
            modified,
        })
    }

    /// Secondary (physical) index for a reference (logical) index.
    pub fn index(&self, logical: usize) -> Result<usize> {
        self.mapping
            .get(logical)
            .copied()
            .ok_or(SimtraderError::IndexOutOfRange {
                index: logical,
                size: self.mapping.len(),
            })
    }

    /// Reference timestamp at a logical index.
    pub fn time(&self, logical: usize) -> Result<NaiveDate> {
        self.times
            .get(logical)
            .copied()
            .ok_or(SimtraderError::IndexOutOfRange {
                index: logical,
                size: self.times.len(),
            })
    }

    /// True if at least one reference timestamp had no exact match.
    pub fn modified(&self) -> bool {
        self.modified
    }

    pub fn size(&self) -> usize {
        self.mapping.len()
    }

    pub fn mapping(&self) -> &[usize] {
        &self.mapping
    }

    pub fn times(&self) -> &[NaiveDate] {
        &self.times
    }
}

impl Identifiable for Synchronizer {
    fn id(&self) -> &Identity {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn days(ds: &[u32]) -> Vec<NaiveDate> {
        ds.iter()
            .map(|&d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect()
    }

    fn sync(reference: &[u32], secondary: &[u32]) -> Synchronizer {
        Synchronizer::create(
            &Identity::new("REF"),
            &days(reference),
            &Identity::new("SEC"),
            &days(secondary),
        )
        .unwrap()
    }

    #[test]
    fn exact_match_is_identity_mapping() {
        let s = sync(&[1, 2, 3], &[1, 2, 3]);
        assert_eq!(s.mapping(), &[0, 1, 2]);
        assert!(!s.modified());
        assert_eq!(s.size(), 3);
    }

    #[test]
    fn missing_secondary_days_forward_fill() {
        let s = sync(&[1, 2, 3, 4], &[1, 3]);
        assert_eq!(s.mapping(), &[0, 0, 1, 1]);
        assert!(s.modified());
    }

    #[test]
    fn secondary_ahead_skips_extra_bars() {
        let s = sync(&[2, 3], &[1, 2, 3, 4]);
        assert_eq!(s.mapping(), &[1, 2]);
        assert!(!s.modified());
    }

    #[test]
    fn reference_before_first_secondary_maps_to_zero() {
        let s = sync(&[1, 2, 3], &[2, 3]);
        assert_eq!(s.mapping(), &[0, 0, 1]);
        assert!(s.modified());
    }

    #[test]
    fn reference_past_secondary_end_fills_last_match() {
        let s = sync(&[1, 2, 5, 6], &[1, 2]);
        assert_eq!(s.mapping(), &[0, 1, 1, 1]);
        assert!(s.modified());
    }

    #[test]
    fn empty_reference_gives_empty_mapping() {
        let s = sync(&[], &[1, 2]);
        assert_eq!(s.size(), 0);
        assert!(!s.modified());
    }

    #[test]
    fn empty_secondary_is_rejected() {
        let err = Synchronizer::create(
            &Identity::new("REF"),
            &days(&[1, 2]),
            &Identity::new("SEC"),
            &[],
        )
        .unwrap_err();
        assert_eq!(err, SimtraderError::EmptySecondary);
    }

    #[test]
    fn index_out_of_range_reports_size_and_index() {
        let s = sync(&[1, 2, 3], &[1, 2, 3]);
        assert_eq!(s.index(2), Ok(2));
        assert_eq!(
            s.index(3),
            Err(SimtraderError::IndexOutOfRange { index: 3, size: 3 })
        );
    }

    #[test]
    fn time_reports_reference_axis() {
        let s = sync(&[1, 2, 3, 4], &[1, 3]);
        assert_eq!(s.time(1).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(s.time(4).is_err());
    }

    #[test]
    fn identity_names_both_sides() {
        let s = sync(&[1], &[1]);
        assert_eq!(s.id().as_str(), "SYNC[REF,SEC]");
    }

    fn sorted_days() -> impl Strategy<Value = Vec<u32>> {
        prop::collection::btree_set(1u32..=28, 0..20).prop_map(|s| s.into_iter().collect())
    }

    proptest! {
        #[test]
        fn mapping_covers_reference_and_stays_in_bounds(
            reference in sorted_days(),
            secondary in sorted_days().prop_filter("non-empty", |v| !v.is_empty()),
        ) {
            let s = sync(&reference, &secondary);
            prop_assert_eq!(s.size(), reference.len());
            prop_assert!(s.mapping().iter().all(|&j| j < secondary.len()));
            prop_assert!(s.mapping().windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn self_sync_is_never_modified(axis in sorted_days().prop_filter("non-empty", |v| !v.is_empty())) {
            let s = sync(&axis, &axis);
            prop_assert!(!s.modified());
            let expected: Vec<usize> = (0..axis.len()).collect();
            prop_assert_eq!(s.mapping(), expected.as_slice());
        }

        #[test]
        fn exact_matches_point_at_equal_timestamps(
            reference in sorted_days(),
            secondary in sorted_days().prop_filter("non-empty", |v| !v.is_empty()),
        ) {
            let s = sync(&reference, &secondary);
            let unmatched = reference.iter().any(|d| !secondary.contains(d));
            prop_assert_eq!(s.modified(), unmatched);
            for (i, d) in reference.iter().enumerate() {
                if secondary.contains(d) {
                    prop_assert_eq!(secondary[s.mapping()[i]], *d);
                }
            }
        }
    }
}
