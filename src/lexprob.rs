//! 語彙翻訳確率
//!
//! このモジュールは、出現一件ごとの語彙翻訳確率対を提供する
//! [`LexicalProbabilities`]トレイトと、単語対の確率表に基づく実装である
//! [`LexProbTable`]を提供します。確率表の推定そのものはこのクレートの
//! 範囲外で、値は外部から与えられます。

use std::sync::Arc;

use hashbrown::HashMap;

use crate::alignment::AlignmentGrid;
use crate::common::WordId;
use crate::corpus::Corpus;
use crate::errors::{HieroError, Result};
use crate::phrases::MatchedPhrases;

/// 未知の単語対および未アラインの単語に適用される既定の下限確率
pub const DEFAULT_FLOOR_PROBABILITY: f32 = 1.0e-9;

/// 語彙翻訳確率の照会インタフェース
///
/// 同じ原言語パターンと目的言語パターンの組でも、出現ごとにアラインメント
/// が異なり得るため、確率は出現単位で計算されます。
pub trait LexicalProbabilities: Send + Sync {
    /// 指定した出現の語彙翻訳確率対を計算します。
    ///
    /// 戻り値は `(p(s|t), p(t|s))` で、いずれも `[0, 1]` の確率です。
    fn calculate_lex_probs(&self, phrases: &MatchedPhrases, occurrence: usize) -> (f32, f32);
}

/// 単語対の確率表に基づく語彙翻訳確率の実装
///
/// 出現の終端記号ランを単語単位で走査し、各単語についてアラインされた
/// 相手側の単語との確率をリンク数で平均し、位置をまたいで積を取ります。
/// アラインされていない単語と表にない単語対には下限確率が適用されます。
pub struct LexProbTable<C> {
    source: Arc<C>,
    target: Arc<C>,
    alignments: Arc<AlignmentGrid>,
    source_given_target: HashMap<(WordId, WordId), f32>,
    target_given_source: HashMap<(WordId, WordId), f32>,
    floor_probability: f32,
}

impl<C> LexProbTable<C>
where
    C: Corpus,
{
    /// 新しい空の確率表を作成します。
    pub fn new(source: Arc<C>, target: Arc<C>, alignments: Arc<AlignmentGrid>) -> Self {
        Self {
            source,
            target,
            alignments,
            source_given_target: HashMap::new(),
            target_given_source: HashMap::new(),
            floor_probability: DEFAULT_FLOOR_PROBABILITY,
        }
    }

    /// 下限確率を設定します。
    ///
    /// # エラー
    ///
    /// 値が `(0, 1]` の範囲外の場合、[`HieroError::InvalidArgument`] が
    /// 返されます。
    pub fn floor_probability(mut self, floor: f32) -> Result<Self> {
        if !(floor > 0.0 && floor <= 1.0) {
            return Err(HieroError::invalid_argument(
                "floor",
                "must be a probability in (0, 1]",
            ));
        }
        self.floor_probability = floor;
        Ok(self)
    }

    /// 単語対の確率 `p(source_word | target_word)` を登録します。
    pub fn set_source_given_target(&mut self, source_word: WordId, target_word: WordId, p: f32) {
        self.source_given_target
            .insert((source_word, target_word), p);
    }

    /// 単語対の確率 `p(target_word | source_word)` を登録します。
    pub fn set_target_given_source(&mut self, target_word: WordId, source_word: WordId, p: f32) {
        self.target_given_source
            .insert((target_word, source_word), p);
    }

    fn within_terminal_runs(
        phrases: &MatchedPhrases,
        occurrence: usize,
        position: usize,
    ) -> bool {
        (0..phrases.num_terminal_runs()).any(|k| {
            position >= phrases.terminal_run_start(occurrence, k)
                && position < phrases.terminal_run_end(occurrence, k)
        })
    }
}

impl<C> LexicalProbabilities for LexProbTable<C>
where
    C: Corpus,
{
    fn calculate_lex_probs(&self, phrases: &MatchedPhrases, occurrence: usize) -> (f32, f32) {
        let mut source_given_target = 1.0f32;
        let mut aligned_target_positions: Vec<usize> = vec![];

        for k in 0..phrases.num_terminal_runs() {
            let run_start = phrases.terminal_run_start(occurrence, k);
            let run_end = phrases.terminal_run_end(occurrence, k);
            for source_position in run_start..run_end {
                let source_word = self.source.word_id(source_position);
                let links = self.alignments.aligned_targets(source_position);
                if links.is_empty() {
                    source_given_target *= self.floor_probability;
                    continue;
                }
                let mut sum = 0.0f32;
                for &target_position in links {
                    let target_word = self.target.word_id(target_position);
                    sum += self
                        .source_given_target
                        .get(&(source_word, target_word))
                        .copied()
                        .unwrap_or(self.floor_probability);
                }
                source_given_target *= sum / links.len() as f32;
                aligned_target_positions.extend_from_slice(links);
            }
        }

        aligned_target_positions.sort_unstable();
        aligned_target_positions.dedup();

        let mut target_given_source = 1.0f32;
        for target_position in aligned_target_positions {
            let target_word = self.target.word_id(target_position);
            let mut sum = 0.0f32;
            let mut num_links = 0usize;
            for &source_position in self.alignments.aligned_sources(target_position) {
                if Self::within_terminal_runs(phrases, occurrence, source_position) {
                    sum += self
                        .target_given_source
                        .get(&(target_word, self.source.word_id(source_position)))
                        .copied()
                        .unwrap_or(self.floor_probability);
                    num_links += 1;
                }
            }
            if num_links > 0 {
                target_given_source *= sum / num_links as f32;
            }
        }

        (source_given_target, target_given_source)
    }
}
