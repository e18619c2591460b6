//! 抽出器のシナリオテストと性質テスト

use hashbrown::HashSet;

use crate::common::{VERY_UNLIKELY, X};
use crate::corpus::Corpus;
use crate::pattern::Pattern;
use crate::phrases::MatchedPhrases;
use crate::rule::Rule;
use crate::span::Span;
use crate::test_utils::{corpus, extractor, grid, synthetic_sentence, StubLexProbs};

/// ルールの比較キー（出力順序は不定のため）
fn sort_key(rules: &[Rule]) -> Vec<(Vec<i32>, [u32; 3])> {
    let mut keys: Vec<_> = rules
        .iter()
        .map(|r| {
            (
                r.target_word_ids().to_vec(),
                [
                    r.scores()[0].to_bits(),
                    r.scores()[1].to_bits(),
                    r.scores()[2].to_bits(),
                ],
            )
        })
        .collect();
    keys.sort();
    keys
}

#[test]
fn test_extracts_terminal_phrase() {
    let source = corpus(&["s0 s1 s2 s3 s4"]);
    let target = corpus(&[&synthetic_sentence("t", 12)]);
    let alignments = grid(5, 12, &[(3, 10), (4, 11)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::with_pairs(vec![(0.5, 0.25)]),
    )
    .max_phrase_span(5)
    .unwrap()
    .max_phrase_length(5)
    .unwrap();

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(3), source.word_id(4)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[3]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.lhs(), X);
    assert_eq!(rule.arity(), 0);
    assert_eq!(rule.source_word_ids(), pattern.word_ids());
    assert_eq!(
        rule.target_word_ids(),
        &[target.word_id(10), target.word_id(11)]
    );
    // one occurrence, one translation
    assert_eq!(rule.scores()[0], 0.0);
    assert_eq!(rule.scores()[1], -(0.5f64.log10()) as f32);
    assert_eq!(rule.scores()[2], -(0.25f64.log10()) as f32);
}

#[test]
fn test_internal_nonterminal_substitution() {
    let source = corpus(&[&synthetic_sentence("s", 8)]);
    let target = corpus(&[&synthetic_sentence("t", 26)]);
    let alignments = grid(8, 26, &[(2, 20), (3, 22), (5, 23), (6, 24)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    );

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(2), -1, source.word_id(6)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[2, 6]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.arity(), 1);
    assert_eq!(
        rule.target_word_ids(),
        &[
            target.word_id(20),
            target.word_id(21),
            -1,
            target.word_id(24)
        ]
    );
}

#[test]
fn test_leading_nonterminal_scans_to_second_candidate() {
    let source = corpus(&[&synthetic_sentence("s", 6)]);
    let target = corpus(&[&synthetic_sentence("t", 8)]);
    // the span starting one word before the terminals is inconsistent,
    // the span starting two words before is consistent
    let alignments = grid(6, 8, &[(2, 5), (2, 6), (3, 6), (4, 7)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    );

    let pattern = Pattern::new(source.vocabulary().clone(), vec![-1, source.word_id(4)]);
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[4]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.arity(), 1);
    assert_eq!(rule.target_word_ids(), &[-1, target.word_id(7)]);
}

#[test]
fn test_trailing_nonterminal_scans_to_second_candidate() {
    let source = corpus(&[&synthetic_sentence("s", 6)]);
    let target = corpus(&[&synthetic_sentence("t", 14)]);
    let alignments = grid(6, 14, &[(2, 10), (3, 12), (4, 11)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    );

    let pattern = Pattern::new(source.vocabulary().clone(), vec![source.word_id(2), -1]);
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[2]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].target_word_ids(), &[target.word_id(10), -1]);
}

#[test]
fn test_double_boundary_nonterminals() {
    let source = corpus(&[&synthetic_sentence("s", 8)]);
    let target = corpus(&[&synthetic_sentence("t", 24)]);
    let alignments = grid(8, 24, &[(3, 20), (4, 21), (5, 22)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    )
    .min_nonterminal_span(1)
    .unwrap();

    let pattern = Pattern::new(source.vocabulary().clone(), vec![-1, source.word_id(4), -2]);
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[4]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.arity(), 2);
    assert_eq!(rule.target_word_ids(), &[-1, target.word_id(21), -2]);
}

#[test]
fn test_nonterminal_labels_encode_reordering() {
    let source = corpus(&["s0 s1 s2 s3 s4"]);
    let target = corpus(&["t0 t1 t2 t3 t4"]);
    // the two gap words swap places on the target side
    let alignments = grid(5, 5, &[(0, 0), (2, 2), (4, 4), (1, 3), (3, 1)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    )
    .min_nonterminal_span(1)
    .unwrap();

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(0), -1, source.word_id(2), -2, source.word_id(4)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[0, 2, 4]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(
        rule.target_word_ids(),
        &[
            target.word_id(0),
            -2,
            target.word_id(2),
            -1,
            target.word_id(4)
        ]
    );

    // arity is preserved on both sides
    let negatives = |words: &[i32]| words.iter().filter(|&&w| w < 0).count();
    assert_eq!(negatives(rule.source_word_ids()), rule.arity());
    assert_eq!(negatives(rule.target_word_ids()), rule.arity());
}

#[test]
fn test_duplicate_translations_average_lexical_probabilities() {
    let source = corpus(&["a b", "a b"]);
    let target = corpus(&["x y", "x y"]);
    let alignments = grid(4, 4, &[(0, 0), (1, 1), (2, 2), (3, 3)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::with_pairs(vec![(0.5, 0.4), (0.3, 0.2)]),
    );

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(0), source.word_id(1)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[0]).unwrap();
    matches.push(1, &[2]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    // duplicates collapse into a single rule
    assert_eq!(rules.len(), 1);
    let rule = &rules[0];
    assert_eq!(rule.scores()[0], 0.0);
    let expected_st = -(((0.5f32 + 0.3f32) as f64 / 2.0).log10()) as f32;
    let expected_ts = -(((0.4f32 + 0.2f32) as f64 / 2.0).log10()) as f32;
    assert_eq!(rule.scores()[1], expected_st);
    assert_eq!(rule.scores()[2], expected_ts);
}

#[test]
fn test_rejects_translation_without_aligned_terminal() {
    let source = corpus(&[&synthetic_sentence("s", 8)]);
    let target = corpus(&[&synthetic_sentence("t", 24)]);
    // only the boundary nonterminals are aligned; the single target word
    // between them has no link back into the terminal run
    let alignments = grid(8, 24, &[(3, 20), (5, 22)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    )
    .min_nonterminal_span(1)
    .unwrap();

    let pattern = Pattern::new(source.vocabulary().clone(), vec![-1, source.word_id(4), -2]);
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[4]).unwrap();

    let translation =
        ex.construct_translation(&matches, 0, Span::new(3, 6), Span::new(20, 23), true, true);
    assert!(translation.is_none());
    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}

#[test]
fn test_rejects_degenerate_nonterminal_overlap() {
    let source = corpus(&[&synthetic_sentence("s", 8)]);
    let target = corpus(&[&synthetic_sentence("t", 24)]);
    // the two nonterminal target spans tile the whole target span
    let alignments = grid(8, 24, &[(3, 20), (3, 21), (5, 22), (5, 23)]);
    let ex = extractor(
        source.clone(),
        target.clone(),
        alignments,
        StubLexProbs::uniform(),
    )
    .min_nonterminal_span(1)
    .unwrap();

    let pattern = Pattern::new(source.vocabulary().clone(), vec![-1, source.word_id(4), -2]);
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[4]).unwrap();

    let translation =
        ex.construct_translation(&matches, 0, Span::new(3, 6), Span::new(20, 24), true, true);
    assert!(translation.is_none());
    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}

/// 刻み幅サンプリング用の共通フィクスチャ
///
/// 5件の出現がそれぞれ異なる翻訳を持ちます。
fn sampling_fixture() -> (
    std::sync::Arc<crate::corpus::CorpusArray>,
    std::sync::Arc<crate::corpus::CorpusArray>,
    std::sync::Arc<crate::alignment::AlignmentGrid>,
) {
    let source = corpus(&["a b", "a b", "a b", "a b", "a b"]);
    let target = corpus(&["u0 v0", "u1 v1", "u2 v2", "u3 v3", "u4 v4"]);
    let links: Vec<(usize, usize)> = (0..10).map(|p| (p, p)).collect();
    let alignments = grid(10, 10, &links);
    (source, target, alignments)
}

fn sampling_matches(source: &crate::corpus::CorpusArray) -> (Pattern, MatchedPhrases) {
    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(0), source.word_id(1)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    for k in 0..5 {
        matches.push(k, &[2 * k]).unwrap();
    }
    (pattern, matches)
}

#[test]
fn test_sampling_visits_every_occurrence_when_small() {
    let (source, target, alignments) = sampling_fixture();
    let ex = extractor(source.clone(), target, alignments, StubLexProbs::uniform());
    let (pattern, matches) = sampling_matches(&source);

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 5);
    let expected = -((1.0f64 / 5.0).log10()) as f32;
    for rule in &rules {
        assert_eq!(rule.scores()[0], expected);
    }
    // all emitted target sequences are pairwise distinct
    let distinct: HashSet<_> = rules.iter().map(|r| r.target_word_ids().to_vec()).collect();
    assert_eq!(distinct.len(), rules.len());
}

#[test]
fn test_sampling_strides_when_large() {
    let (source, target, alignments) = sampling_fixture();
    let ex = extractor(source.clone(), target.clone(), alignments, StubLexProbs::uniform())
        .sample_size(2)
        .unwrap();
    let (pattern, matches) = sampling_matches(&source);

    // step = floor(5 / 2) = 2, so occurrences 0, 2, and 4 are visited
    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 3);
    let expected = -((1.0f64 / 3.0).log10()) as f32;
    let mut seen = vec![];
    for rule in &rules {
        assert_eq!(rule.scores()[0], expected);
        seen.push(rule.target_word_ids().to_vec());
    }
    seen.sort();
    let mut visited: Vec<Vec<i32>> = [0usize, 2, 4]
        .iter()
        .map(|&k| vec![target.word_id(2 * k), target.word_id(2 * k + 1)])
        .collect();
    visited.sort();
    assert_eq!(seen, visited);
}

#[test]
fn test_extraction_is_deterministic() {
    let source = corpus(&["a b", "a b"]);
    let target = corpus(&["x y", "x y"]);
    let alignments = grid(4, 4, &[(0, 0), (1, 1), (2, 2), (3, 3)]);
    let ex = extractor(
        source.clone(),
        target,
        alignments,
        StubLexProbs::with_pairs(vec![(0.7, 0.6), (0.3, 0.1)]),
    );

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(0), source.word_id(1)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[0]).unwrap();
    matches.push(1, &[2]).unwrap();

    let first = ex.extract_rules(&pattern, &matches);
    let second = ex.extract_rules(&pattern, &matches);
    assert_eq!(sort_key(&first), sort_key(&second));
}

#[test]
fn test_phrase_span_cap_rejects_wide_spans() {
    let source = corpus(&[&synthetic_sentence("s", 8)]);
    let target = corpus(&[&synthetic_sentence("t", 26)]);
    let alignments = grid(8, 26, &[(2, 20), (3, 22), (5, 23), (6, 24)]);
    let ex = extractor(source.clone(), target, alignments, StubLexProbs::uniform())
        .max_phrase_span(4)
        .unwrap();

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(2), -1, source.word_id(6)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[2, 6]).unwrap();

    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}

#[test]
fn test_phrase_length_cap_applies_to_terminal_phrases() {
    let source = corpus(&["s0 s1 s2 s3 s4"]);
    let target = corpus(&[&synthetic_sentence("t", 12)]);
    let alignments = grid(5, 12, &[(3, 10), (4, 11)]);
    let ex = extractor(source.clone(), target, alignments, StubLexProbs::uniform())
        .max_phrase_length(1)
        .unwrap();

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(3), source.word_id(4)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[3]).unwrap();

    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}

#[test]
fn test_minimum_nonterminal_span_rejects_short_gaps() {
    let source = corpus(&[&synthetic_sentence("s", 8)]);
    let target = corpus(&[&synthetic_sentence("t", 26)]);
    let alignments = grid(8, 26, &[(2, 20), (3, 22), (5, 23), (6, 24)]);
    let ex = extractor(source.clone(), target, alignments, StubLexProbs::uniform())
        .min_nonterminal_span(4)
        .unwrap();

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(2), -1, source.word_id(6)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[2, 6]).unwrap();

    // the nonterminal gap covers three source words only
    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}

#[test]
fn test_maximum_nonterminal_span_bounds_leading_scan() {
    let source = corpus(&[&synthetic_sentence("s", 6)]);
    let target = corpus(&[&synthetic_sentence("t", 8)]);
    let alignments = grid(6, 8, &[(2, 5), (2, 6), (3, 6), (4, 7)]);
    let ex = extractor(source.clone(), target, alignments, StubLexProbs::uniform())
        .min_nonterminal_span(1)
        .unwrap()
        .max_nonterminal_span(1)
        .unwrap();

    let pattern = Pattern::new(source.vocabulary().clone(), vec![-1, source.word_id(4)]);
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[4]).unwrap();

    // the only candidate span within the cap is inconsistent
    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}

#[test]
fn test_zero_probability_sums_clamp_to_sentinel() {
    let source = corpus(&["s0 s1 s2 s3 s4"]);
    let target = corpus(&[&synthetic_sentence("t", 12)]);
    let alignments = grid(5, 12, &[(3, 10), (4, 11)]);
    let ex = extractor(
        source.clone(),
        target,
        alignments,
        StubLexProbs::with_pairs(vec![(0.0, 0.0)]),
    );

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(3), source.word_id(4)],
    );
    let mut matches = MatchedPhrases::new(pattern.clone()).unwrap();
    matches.push(0, &[3]).unwrap();

    let rules = ex.extract_rules(&pattern, &matches);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].scores()[1], VERY_UNLIKELY);
    assert_eq!(rules[0].scores()[2], VERY_UNLIKELY);
}

#[test]
fn test_no_occurrences_yield_no_rules() {
    let source = corpus(&["a b"]);
    let target = corpus(&["x y"]);
    let alignments = grid(2, 2, &[(0, 0), (1, 1)]);
    let ex = extractor(source.clone(), target, alignments, StubLexProbs::uniform());

    let pattern = Pattern::new(
        source.vocabulary().clone(),
        vec![source.word_id(0), source.word_id(1)],
    );
    let matches = MatchedPhrases::new(pattern.clone()).unwrap();

    assert!(ex.extract_rules(&pattern, &matches).is_empty());
}
