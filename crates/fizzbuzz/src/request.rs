use crate::{Error, Result};
use core::iter::FusedIterator;
use core::ops::RangeInclusive;

/// An immutable parameter set describing one FizzBuzz computation.
///
/// Items run from `1` to `limit` inclusive. Multiples of `int1` are replaced by
/// `str1`, multiples of `int2` by `str2`, and common multiples by `str1`
/// followed by `str2`.
///
/// Equality and hashing are structural, so two requests with the same field
/// values are the same statistics key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    limit: i64,
    int1: i64,
    int2: i64,
    str1: String,
    str2: String,
}

impl Request {
    /// Creates a new request. No validation happens here; see
    /// [`Self::validate`].
    pub fn new(
        limit: i64,
        int1: i64,
        int2: i64,
        str1: impl Into<String>,
        str2: impl Into<String>,
    ) -> Self {
        Self {
            limit,
            int1,
            int2,
            str1: str1.into(),
            str2: str2.into(),
        }
    }

    /// Inclusive upper bound of the sequence.
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    pub const fn int1(&self) -> i64 {
        self.int1
    }

    pub const fn int2(&self) -> i64 {
        self.int2
    }

    pub fn str1(&self) -> &str {
        &self.str1
    }

    pub fn str2(&self) -> &str {
        &self.str2
    }

    /// Checks that the request can be rendered.
    ///
    /// `limit`, `int1` and `int2` must all be `>= 1`. They are checked in that
    /// order and only the first violation is reported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first offending field.
    pub const fn validate(&self) -> Result<()> {
        if self.limit < 1 {
            return Err(Error::InvalidParameter {
                field: "limit",
                value: self.limit,
            });
        }
        if self.int1 < 1 {
            return Err(Error::InvalidParameter {
                field: "int1",
                value: self.int1,
            });
        }
        if self.int2 < 1 {
            return Err(Error::InvalidParameter {
                field: "int2",
                value: self.int2,
            });
        }
        Ok(())
    }

    /// Computes the item at position `i` (1-indexed).
    ///
    /// `int1` and `int2` are used as divisors, so only call this on a request
    /// that passed [`Request::validate`]. [`Request::items`] does that check.
    ///
    /// # Panics
    ///
    /// Panics if `int1` or `int2` is zero, or if `i` is `i64::MIN` and a
    /// divisor is `-1`.
    pub fn item(&self, i: i64) -> String {
        let by_int1 = i % self.int1 == 0;
        let by_int2 = i % self.int2 == 0;
        match (by_int1, by_int2) {
            (true, true) => {
                let mut item = String::with_capacity(self.str1.len() + self.str2.len());
                item.push_str(&self.str1);
                item.push_str(&self.str2);
                item
            }
            (true, false) => self.str1.clone(),
            (false, true) => self.str2.clone(),
            (false, false) => i.to_string(),
        }
    }

    /// Returns a lazy iterator over every item of the sequence.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the request cannot be rendered.
    pub fn items(&self) -> Result<RequestItems<'_>> {
        self.validate()?;
        Ok(RequestItems {
            request: self,
            positions: 1..=self.limit,
        })
    }
}

/// Synchronous, lazily computed sequence of a validated [`Request`].
///
/// Created by [`Request::items`].
#[derive(Clone, Debug)]
pub struct RequestItems<'a> {
    request: &'a Request,
    positions: RangeInclusive<i64>,
}

impl Iterator for RequestItems<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.positions.next().map(|i| self.request.item(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Saturates to `(usize::MAX, None)` when `limit` does not fit in usize.
        self.positions.size_hint()
    }
}

impl FusedIterator for RequestItems<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_sync(request: &Request) -> String {
        request.items().unwrap().collect::<Vec<_>>().join(",")
    }

    #[test]
    fn validate_accepts_minimal_request() {
        assert_eq!(Request::new(1, 1, 1, "", "").validate(), Ok(()));
    }

    #[test]
    fn validate_reports_first_violation_in_order() {
        let err = Request::new(0, 0, 0, "A", "B").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "limit parameter must be >= 1, value 0 was given"
        );

        let err = Request::new(10, -3, 0, "A", "B").validate().unwrap_err();
        assert_eq!(err.field(), "int1");
        assert_eq!(
            err.to_string(),
            "int1 parameter must be >= 1, value -3 was given"
        );

        let err = Request::new(10, 3, 0, "A", "B").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "int2 parameter must be >= 1, value 0 was given"
        );
    }

    #[test]
    fn validate_is_idempotent() {
        let request = Request::new(-1, 3, 5, "A", "B");
        assert_eq!(request.validate(), request.validate());
        let request = Request::new(1, 3, 5, "A", "B");
        assert_eq!(request.validate(), request.validate());
    }

    #[test]
    fn items_substitute_multiples() {
        let request = Request::new(20, 3, 5, "A", "B");
        assert_eq!(
            render_sync(&request),
            "1,2,A,4,B,A,7,8,A,B,11,A,13,14,AB,16,17,A,19,B"
        );
    }

    #[test]
    fn items_with_equal_divisors_concatenate_in_order() {
        let request = Request::new(10, 3, 3, "A", "B");
        assert_eq!(render_sync(&request), "1,2,AB,4,5,AB,7,8,AB,10");
    }

    #[test]
    fn items_keep_str1_first_when_int1_is_larger() {
        let request = Request::new(10, 10, 2, "A", "B");
        assert_eq!(render_sync(&request), "1,B,3,B,5,B,7,B,9,AB");
    }

    #[test]
    fn items_with_limit_below_divisor() {
        let request = Request::new(10, 30, 3, "A", "B");
        assert_eq!(render_sync(&request), "1,2,B,4,5,B,7,8,B,10");

        let request = Request::new(4, 5, 7, "A", "B");
        assert_eq!(render_sync(&request), "1,2,3,4");
    }

    #[test]
    fn items_with_empty_strings_are_empty() {
        let request = Request::new(6, 2, 3, "", "");
        assert_eq!(render_sync(&request), "1,,,,5,");
    }

    #[test]
    fn items_report_remaining_size() {
        let request = Request::new(42, 3, 5, "A", "B");
        let mut items = request.items().unwrap();
        assert_eq!(items.size_hint(), (42, Some(42)));
        items.next();
        assert_eq!(items.size_hint(), (41, Some(41)));
        assert_eq!(items.count(), 41);
    }

    #[test]
    fn items_size_hint_never_underreports_large_limits() {
        let request = Request::new(i64::MAX, 3, 5, "A", "B");
        let items = request.items().unwrap();
        let (lower, upper) = items.size_hint();
        match usize::try_from(i64::MAX) {
            Ok(max) => assert_eq!((lower, upper), (max, Some(max))),
            Err(_) => assert_eq!((lower, upper), (usize::MAX, None)),
        }
    }

    #[test]
    #[should_panic]
    fn item_panics_on_zero_divisor() {
        let _ = Request::new(10, 0, 5, "A", "B").item(5);
    }

    #[test]
    fn items_rejects_invalid_request() {
        let request = Request::new(5, 3, 0, "A", "B");
        assert!(request.items().is_err());
    }

    #[test]
    fn equal_fields_are_equal_keys() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Request::new(10, 3, 5, "A", "B"));
        set.insert(Request::new(10, 3, 5, String::from("A"), String::from("B")));
        set.insert(Request::new(10, 3, 5, "A", "C"));
        assert_eq!(set.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_field_names() {
        let request = Request::new(10, 3, 5, "A", "B");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"limit": 10, "int1": 3, "int2": 5, "str1": "A", "str2": "B"})
        );
    }
}
