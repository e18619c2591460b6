//! テスト用のユーティリティ
//!
//! 抽出シナリオのテストで共有される小さなコーパス・アラインメント・
//! 語彙確率スタブの構築ヘルパを提供します。

use std::sync::Arc;

use crate::alignment::AlignmentGrid;
use crate::corpus::CorpusArray;
use crate::extractor::Extractor;
use crate::lexprob::LexicalProbabilities;
use crate::phrases::MatchedPhrases;

pub(crate) type TestExtractor = Extractor<CorpusArray, AlignmentGrid, StubLexProbs>;

/// `prefix0 prefix1 … prefix(len-1)` の形の文を生成します。
pub(crate) fn synthetic_sentence(prefix: &str, len: usize) -> String {
    (0..len)
        .map(|i| format!("{}{}", prefix, i))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn corpus(sentences: &[&str]) -> Arc<CorpusArray> {
    Arc::new(CorpusArray::from_sentences(sentences))
}

pub(crate) fn grid(
    source_len: usize,
    target_len: usize,
    links: &[(usize, usize)],
) -> Arc<AlignmentGrid> {
    Arc::new(AlignmentGrid::from_links(source_len, target_len, links.iter().copied()).unwrap())
}

/// 出現インデックスごとに固定の語彙確率対を返すスタブ
///
/// 用意されていないインデックスには `(1.0, 1.0)` を返します。
pub(crate) struct StubLexProbs {
    pairs: Vec<(f32, f32)>,
}

impl StubLexProbs {
    pub(crate) fn with_pairs(pairs: Vec<(f32, f32)>) -> Arc<Self> {
        Arc::new(Self { pairs })
    }

    pub(crate) fn uniform() -> Arc<Self> {
        Arc::new(Self { pairs: vec![] })
    }
}

impl LexicalProbabilities for StubLexProbs {
    fn calculate_lex_probs(&self, _phrases: &MatchedPhrases, occurrence: usize) -> (f32, f32) {
        self.pairs.get(occurrence).copied().unwrap_or((1.0, 1.0))
    }
}

pub(crate) fn extractor(
    source: Arc<CorpusArray>,
    target: Arc<CorpusArray>,
    alignments: Arc<AlignmentGrid>,
    lexprobs: Arc<StubLexProbs>,
) -> TestExtractor {
    Extractor::new(source, target, alignments, lexprobs)
}
