/// Default minimum similarity for two food names to count as the same food
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

const HANGUL_BASE: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const MEDIALS_TIMES_FINALS: u32 = 21 * 28;
const FINALS: u32 = 28;

// Conjoining jamo blocks
const INITIAL_BASE: u32 = 0x1100;
const MEDIAL_BASE: u32 = 0x1161;
const FINAL_BASE: u32 = 0x11A7;

/// Convert count to f64 for ratio calculations.
#[inline]
#[allow(clippy::cast_precision_loss)] // Names are far shorter than 2^52 symbols
fn count_to_f64(count: usize) -> f64 {
    count as f64
}

/// Split a name into comparison symbols.
///
/// Precomposed Hangul syllables become their initial, medial and (if
/// present) final jamo, so `잌` is two edits from `이크` instead of two
/// unrelated syllables. Every other code point
/// is kept as-is.
fn symbols(s: &str) -> Vec<u32> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let cp = u32::from(c);
        if (HANGUL_BASE..=HANGUL_LAST).contains(&cp) {
            let index = cp - HANGUL_BASE;
            out.push(INITIAL_BASE + index / MEDIALS_TIMES_FINALS);
            out.push(MEDIAL_BASE + (index % MEDIALS_TIMES_FINALS) / FINALS);
            let tail = index % FINALS;
            if tail != 0 {
                out.push(FINAL_BASE + tail);
            }
        } else {
            out.push(cp);
        }
    }
    out
}

/// Edit distance between two names, counted over jamo symbols
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::generic_levenshtein(&symbols(a), &symbols(b))
}

/// Similarity of two names in `[0, 1]`: `1 - distance / max(len)`.
///
/// No case folding or trimming is done. Two empty names are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a = symbols(a);
    let b = symbols(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    1.0 - count_to_f64(strsim::generic_levenshtein(&a, &b)) / count_to_f64(longest)
}

/// True when the names are equal or at least `threshold` similar
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    a == b || similarity(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        // 개 and 게 differ only in the vowel
        assert_eq!(levenshtein_distance("김치찌개", "김치찌게"), 1);
        // 쉐이크 -> 쉐잌 drops one initial and moves the ㅋ to a final
        assert_eq!(levenshtein_distance("이크", "잌"), 2);
    }

    #[test]
    fn test_symbols_decompose_hangul() {
        // 잌 = ㅇ + ㅣ + ㅋ
        assert_eq!(symbols("잌"), vec![0x110B, 0x1175, 0x11BF]);
        // 이 has no final consonant
        assert_eq!(symbols("이"), vec![0x110B, 0x1175]);
        assert_eq!(symbols("a1"), vec![u32::from('a'), u32::from('1')]);
    }

    #[test]
    fn test_typo_is_similar() {
        assert!(is_similar("프로틴쉐이크", "프로틴쉐잌", DEFAULT_SIMILARITY_THRESHOLD));
        assert!(similarity("프로틴쉐이크", "프로틴쉐잌") > 0.8);
    }

    #[test]
    fn test_jamo_widens_related_dishes() {
        // Whole syllables give 0.5; jamo put 김치찜 within reach of 김치찌개
        assert!((strsim::normalized_levenshtein("김치찜", "김치찌개") - 0.5).abs() < 1e-12);
        assert_eq!(levenshtein_distance("김치찜", "김치찌개"), 2);
        assert!((similarity("김치찜", "김치찌개") - 7.0 / 9.0).abs() < 1e-12);
        assert!(is_similar("김치찜", "김치찌개", DEFAULT_SIMILARITY_THRESHOLD));
    }

    #[test]
    fn test_unrelated_names_not_similar() {
        assert!(!is_similar("치킨", "샐러드", DEFAULT_SIMILARITY_THRESHOLD));
        assert!(!is_similar("김밥", "김치", DEFAULT_SIMILARITY_THRESHOLD));
    }

    #[test]
    fn test_exact_match_always_similar() {
        assert!(is_similar("비빔밥", "비빔밥", 1.0));
        assert!((similarity("비빔밥", "비빔밥") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_strings() {
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "김밥") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_case_and_whitespace_not_normalized() {
        assert!(similarity("Salad", "salad") < 1.0);
        assert!(similarity("김밥 ", "김밥") < 1.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let pairs = [("된장찌개", "된장국"), ("라면", "라멘"), ("abc", "abd")];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-12);
        }
    }
}
