use rulinalg::vector::Vector;
use std::collections::BTreeMap;
use std::fmt::Debug;

pub struct Assertion<'t, T>
where
    T: 't + Debug + ?Sized,
{
    pub actual: &'t T,
}

#[macro_export]
macro_rules! assert_that {
    ($actual:expr) => {{
        $crate::testing::assertions::Assertion { actual: &$actual }
    }};
}

/**
 * Option Assertions
 */
impl<'a, T> Assertion<'a, Option<T>>
where
    T: 'a + Debug + PartialEq,
{
    pub fn contains(self, expected: T) {
        match self.actual {
            None => panic!("expected Option to contain {:?}, was None", expected),
            Some(actual) => assert_eq!(actual, &expected),
        }
    }

    pub fn is_empty(self) {
        match self.actual {
            None => {}
            Some(actual) => panic!(
                "expected Option to be None, actually contained {:?}",
                actual
            ),
        }
    }
}

/**
 * Vec Assertions
 */
impl<'a, T> Assertion<'a, Vec<T>>
where
    T: 'a + Debug + PartialEq,
{
    pub fn is_empty(self) {
        assert!(
            self.actual.is_empty(),
            "expected empty Vec, was {:?}",
            self.actual
        );
    }

    pub fn has_size(&self, size: usize) {
        assert_eq!(self.actual.len(), size, "in {:?}", self.actual);
    }

    pub fn contains(&self, expected: T) {
        assert!(
            self.actual.contains(&expected),
            "expected {:?} to contain {:?}",
            self.actual,
            expected
        );
    }
}

/**
 * BTreeMap Assertions
 */
impl<'a, K, V> Assertion<'a, BTreeMap<K, V>>
where
    K: 'a + Debug + Ord,
    V: 'a + Debug,
{
    pub fn is_empty(self) {
        assert!(self.actual.is_empty(), "actual wasn't empty!");
    }

    pub fn has_size(&self, size: usize) {
        assert_eq!(self.actual.len(), size);
    }

    pub fn has_key<Q>(&self, key: &Q)
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + Debug + ?Sized,
    {
        assert!(
            self.actual.contains_key(key),
            "expected key {:?}, keys were {:?}",
            key,
            self.actual.keys().collect::<Vec<_>>()
        );
    }
}

/**
 * Float Assertions
 */
impl<'a> Assertion<'a, f64> {
    pub fn is_close_to(&self, expected: f64, tolerance: f64) {
        assert!(
            (self.actual - expected).abs() <= tolerance,
            "expected {} to be within {} of {}",
            self.actual,
            tolerance,
            expected
        );
    }

    pub fn is_finite(&self) {
        assert!(self.actual.is_finite(), "expected finite, was {}", self.actual);
    }
}

impl<'a> Assertion<'a, Vector<f64>> {
    pub fn all_finite(&self) {
        for (i, v) in self.actual.iter().enumerate() {
            assert!(v.is_finite(), "entry {} is not finite: {}", i, v);
        }
    }

    pub fn all_positive(&self) {
        for (i, v) in self.actual.iter().enumerate() {
            assert!(*v > 0., "entry {} is not positive: {}", i, v);
        }
    }

    pub fn sums_to(&self, expected: f64, tolerance: f64) {
        let sum: f64 = self.actual.iter().sum();
        assert!(
            (sum - expected).abs() <= tolerance,
            "expected entries to sum to {}, sum was {}",
            expected,
            sum
        );
    }
}
