//! Selection expressions for picking search results by position.
//!
//! An expression is a list of tokens separated by whitespace or commas. Each
//! token is a 1-based number `n` or an inclusive range `n-m`:
//!
//! ```
//! use elibrary_core::selection::parse_indexes;
//!
//! assert_eq!(parse_indexes("1 2 3, 1-3", 5).unwrap(), vec![0, 1, 2, 0, 1, 2]);
//! ```

mod error;

pub use error::SelectionError;

/// Parses a selection expression into 0-based indices.
///
/// Order follows the expression; ranges expand ascending; duplicates are kept.
///
/// # Errors
///
/// - [`SelectionError::Parse`] for non-numeric parts or more than one `-` in a token
/// - [`SelectionError::IndexOutOfRange`] for `0` or any number above `index_max`
/// - [`SelectionError::DescendingRange`] for `n-m` with `m < n`
/// - [`SelectionError::Empty`] when the expression has no tokens
pub fn parse_indexes(expression: &str, index_max: usize) -> Result<Vec<usize>, SelectionError> {
    let mut indexes = Vec::new();
    let tokens = expression
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty());

    for token in tokens {
        let parts: Vec<&str> = token.split('-').collect();
        match parts.as_slice() {
            [single] => {
                let value = parse_number(token, single)?;
                indexes.push(to_index(value, index_max)?);
            }
            [start, end] => {
                let start_value = parse_number(token, start)?;
                let end_value = parse_number(token, end)?;
                let first = to_index(start_value, index_max)?;
                let last = to_index(end_value, index_max)?;
                if last < first {
                    return Err(SelectionError::DescendingRange {
                        token: token.to_string(),
                        start: start_value,
                        end: end_value,
                    });
                }
                indexes.extend(first..=last);
            }
            _ => {
                return Err(SelectionError::parse(
                    token,
                    format!("expected a number or a range, got {} parts", parts.len()),
                ));
            }
        }
    }

    if indexes.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(indexes)
}

fn parse_number(token: &str, part: &str) -> Result<u64, SelectionError> {
    part.parse::<u64>()
        .map_err(|_| SelectionError::parse(token, format!("'{part}' is not a number")))
}

fn to_index(value: u64, index_max: usize) -> Result<usize, SelectionError> {
    let out_of_range = SelectionError::IndexOutOfRange {
        value,
        max: index_max,
    };
    let Ok(one_based) = usize::try_from(value) else {
        return Err(out_of_range);
    };
    if one_based == 0 || one_based > index_max {
        return Err(out_of_range);
    }
    Ok(one_based - 1)
}
