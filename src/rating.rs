/// Ratings are integers in 0..=MAX_RATING, enforced at catalog ingestion.
pub const MAX_RATING: u8 = 5;

const FILLED: char = '★';
const UNFILLED: char = '☆';

/// Render a rating as a fixed run of five stars, filled first.
/// `stars(3)` is `"★★★☆☆"`. Always exactly five symbols.
pub fn stars(rate: u8) -> String {
    let filled = usize::from(rate.min(MAX_RATING));
    let mut out = String::with_capacity(usize::from(MAX_RATING) * FILLED.len_utf8());
    for _ in 0..filled {
        out.push(FILLED);
    }
    for _ in filled..usize::from(MAX_RATING) {
        out.push(UNFILLED);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_counts() {
        for rate in 0..=MAX_RATING {
            let rendered = stars(rate);
            let filled = rendered.chars().filter(|&c| c == FILLED).count();
            let unfilled = rendered.chars().filter(|&c| c == UNFILLED).count();
            assert_eq!(filled, usize::from(rate));
            assert_eq!(unfilled, usize::from(MAX_RATING - rate));
            assert_eq!(rendered.chars().count(), usize::from(MAX_RATING));
        }
    }

    #[test]
    fn test_filled_stars_come_first() {
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(5), "★★★★★");
    }

    #[test]
    fn test_over_range_saturates() {
        // Ingestion clamps, but the renderer still never emits more than five.
        assert_eq!(stars(200), "★★★★★");
    }
}
