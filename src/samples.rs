//! Sample solutions used by the bundled suites and the tests
//!
//! They are written the way a solution author would write them: read through
//! [`crate::console`], print with [`crate::outln!`], return `anyhow::Result`.

use crate::console;

/// Largest rectangle under a fence of planks.
///
/// Input: case count `C`, then for each case the plank count `N` and `N`
/// heights. Prints one area per case. Stops early if the input runs out.
pub fn fence() -> anyhow::Result<()> {
    let cases: usize = console::next()?;
    for _ in 0..cases {
        let Some(token) = console::next_token()? else {
            break;
        };
        let n: usize = token.parse()?;
        let heights = (0..n)
            .map(|_| console::next::<u64>())
            .collect::<Result<Vec<_>, _>>()?;
        crate::outln!("{}", largest_rectangle(&heights));
    }
    Ok(())
}

/// Monotonic stack over the heights, O(n)
pub fn largest_rectangle(heights: &[u64]) -> u64 {
    let mut stack: Vec<usize> = Vec::with_capacity(heights.len());
    let mut best = 0;

    for i in 0..=heights.len() {
        let current = heights.get(i).copied().unwrap_or(0);
        while let Some(&top) = stack.last() {
            if heights[top] < current {
                break;
            }
            stack.pop();
            let left = stack.last().map_or(0, |&j| j + 1);
            best = best.max(heights[top] * (i - left) as u64);
        }
        stack.push(i);
    }

    best
}

/// Copy the whole input to the output
pub fn echo() -> anyhow::Result<()> {
    let text = console::read_to_string()?;
    crate::out!("{}", text);
    Ok(())
}

/// Sum every integer in the input
pub fn sum() -> anyhow::Result<()> {
    let mut total: i64 = 0;
    while let Some(token) = console::next_token()? {
        total += token.parse::<i64>()?;
    }
    crate::outln!("{}", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_rectangle() {
        assert_eq!(largest_rectangle(&[7, 1, 5, 9, 6, 7, 3]), 20);
        assert_eq!(largest_rectangle(&[1, 4, 4, 4, 4, 1, 1]), 16);
        assert_eq!(largest_rectangle(&[1, 8, 2, 2]), 8);
        assert_eq!(largest_rectangle(&[]), 0);
        assert_eq!(largest_rectangle(&[3, 3, 3]), 9);
    }
}
