use crate::server::service::ApiError;
use fizzbuzz::Request;

/// Query parameters as received, in order.
///
/// When a key is repeated, the first value wins. A missing key reads as the
/// empty string.
pub type QueryPairs = [(String, String)];

fn first<'a>(pairs: &'a QueryPairs, key: &str) -> &'a str {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map_or("", |(_, v)| v.as_str())
}

fn parse_int(pairs: &QueryPairs, field: &'static str) -> Result<i64, ApiError> {
    let raw = first(pairs, field);
    raw.parse().map_err(|_| ApiError::NotAnInteger {
        field,
        value: raw.to_owned(),
    })
}

/// Builds a [`Request`] from `/render` query parameters.
///
/// `limit`, `int1` and `int2` are parsed in that order and the first one that
/// is not an integer is reported. `str1` and `str2` are taken verbatim.
/// Range checks are left to [`Request::validate`].
///
/// # Errors
///
/// Returns [`ApiError::NotAnInteger`] naming the first unparsable field.
pub fn parse_request(pairs: &QueryPairs) -> Result<Request, ApiError> {
    let limit = parse_int(pairs, "limit")?;
    let int1 = parse_int(pairs, "int1")?;
    let int2 = parse_int(pairs, "int2")?;
    Ok(Request::new(
        limit,
        int1,
        int2,
        first(pairs, "str1"),
        first(pairs, "str2"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn parses_all_fields() {
        let request = parse_request(&pairs(&[
            ("limit", "15"),
            ("int1", "3"),
            ("int2", "5"),
            ("str1", "fizz"),
            ("str2", "buzz"),
        ]))
        .unwrap();
        assert_eq!(request, Request::new(15, 3, 5, "fizz", "buzz"));
    }

    #[test]
    fn missing_strings_are_empty() {
        let request =
            parse_request(&pairs(&[("limit", "15"), ("int1", "3"), ("int2", "5")])).unwrap();
        assert_eq!(request, Request::new(15, 3, 5, "", ""));
    }

    #[test]
    fn negative_and_zero_integers_reach_validation() {
        let request =
            parse_request(&pairs(&[("limit", "0"), ("int1", "-3"), ("int2", "+5")])).unwrap();
        assert_eq!(request, Request::new(0, -3, 5, "", ""));
    }

    #[test]
    fn first_unparsable_field_is_reported() {
        let err = parse_request(&pairs(&[("limit", "ten"), ("int1", "x")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "limit parameter must be an integer, value ten was given"
        );

        let err = parse_request(&pairs(&[("limit", "10"), ("int2", "5")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "int1 parameter must be an integer, value  was given"
        );

        let err =
            parse_request(&pairs(&[("limit", "10"), ("int1", "3"), ("int2", "5.5")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "int2 parameter must be an integer, value 5.5 was given"
        );
    }

    #[test]
    fn repeated_key_uses_first_value() {
        let request = parse_request(&pairs(&[
            ("limit", "10"),
            ("limit", "oops"),
            ("int1", "3"),
            ("int2", "5"),
        ]))
        .unwrap();
        assert_eq!(request.limit(), 10);
    }
}
