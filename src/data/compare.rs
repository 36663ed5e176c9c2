use super::filter::Subset;
use super::model::Measure;

/// Signed gap between allocated and executed budgets.
/// Positive means under-execution, negative means overspend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub absolute: f64,
    /// Percent of the allocated amount; 0 when nothing was allocated.
    pub percentage: f64,
}

/// Gap between an allocated and an executed amount.
pub fn compare(allocated: f64, executed: f64) -> Gap {
    let absolute = allocated - executed;
    let percentage = if allocated != 0.0 {
        absolute / allocated * 100.0
    } else {
        0.0
    };
    Gap {
        absolute,
        percentage,
    }
}

/// Allocated vs. executed totals over a subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub allocated: f64,
    pub executed: f64,
    pub gap: Gap,
}

impl Comparison {
    /// Both totals are zero: nothing valid to compare.
    pub fn is_empty(&self) -> bool {
        self.allocated == 0.0 && self.executed == 0.0
    }
}

/// Sum both expense columns over the subset (missing values as zero) and
/// compare them.
pub fn compare_totals(subset: &Subset<'_>) -> Comparison {
    let (allocated, executed) = subset.records().fold((0.0, 0.0), |(a, e), rec| {
        (
            a + Measure::Allocated.value_of(rec).unwrap_or(0.0),
            e + Measure::Executed.value_of(rec).unwrap_or(0.0),
        )
    });
    Comparison {
        allocated,
        executed,
        gap: compare(allocated, executed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterCriteria};
    use crate::data::model::{Dataset, Record};

    #[test]
    fn zero_allocation_reports_zero_percent() {
        assert_eq!(
            compare(0.0, 0.0),
            Gap {
                absolute: 0.0,
                percentage: 0.0
            }
        );
        let overspend_from_nothing = compare(0.0, 5.0);
        assert_eq!(overspend_from_nothing.absolute, -5.0);
        assert_eq!(overspend_from_nothing.percentage, 0.0);
    }

    #[test]
    fn under_execution_and_overspend() {
        assert_eq!(
            compare(100.0, 60.0),
            Gap {
                absolute: 40.0,
                percentage: 40.0
            }
        );
        assert_eq!(
            compare(100.0, 120.0),
            Gap {
                absolute: -20.0,
                percentage: -20.0
            }
        );
    }

    #[test]
    fn totals_over_empty_subset_are_empty() {
        let ds = Dataset::from_records(vec![Record::new("MinA", 2020)], vec![]);
        let subset = filter(&ds, &FilterCriteria::years(2020, 2020));
        let cmp = compare_totals(&subset);
        assert!(cmp.is_empty());
        assert_eq!(cmp.gap.percentage, 0.0);
    }
}
