//! 同期文法ルールの抽出器
//!
//! このモジュールは、原言語パターンとその出現記録から同期文脈自由文法の
//! ルールを抽出するメイン構造体[`Extractor`]を提供します。
//!
//! # 主要な構造体
//!
//! - [`Extractor`]: サンプリング・翻訳構築・集約を駆動する抽出器
//!
//! # 例
//!
//! ```no_run
//! use std::sync::Arc;
//! use hiero::{AlignmentGrid, CorpusArray, Extractor, LexProbTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(CorpusArray::from_sentences(&["watashi wa hashiru"]));
//! let target = Arc::new(CorpusArray::from_sentences(&["i run"]));
//! let alignments = Arc::new(AlignmentGrid::from_pharaoh(
//!     source.as_ref(),
//!     target.as_ref(),
//!     &["0-0 2-1"],
//! )?);
//! let lexprobs = Arc::new(LexProbTable::new(
//!     source.clone(),
//!     target.clone(),
//!     alignments.clone(),
//! ));
//! let extractor = Extractor::new(source, target, alignments, lexprobs)
//!     .sample_size(100)?
//!     .max_phrase_span(8)?;
//! # Ok(())
//! # }
//! ```
pub(crate) mod translation;

use std::sync::Arc;

use hashbrown::HashMap;
use log::{debug, trace};

use crate::alignment::Alignments;
use crate::common::{VERY_UNLIKELY, X};
use crate::corpus::Corpus;
use crate::errors::{HieroError, Result};
use crate::lexprob::LexicalProbabilities;
use crate::pattern::Pattern;
use crate::phrases::MatchedPhrases;
use crate::rule::Rule;

/// 既定のサンプリング上限
pub const DEFAULT_SAMPLE_SIZE: usize = 300;

/// 原言語区間の長さの既定上限
pub const DEFAULT_MAX_PHRASE_SPAN: usize = 10;

/// 非終端記号を含まないフレーズの長さの既定上限
pub const DEFAULT_MAX_PHRASE_LENGTH: usize = 10;

/// 非終端記号の原言語区間の長さの既定下限
pub const DEFAULT_MIN_NONTERMINAL_SPAN: usize = 2;

/// 非終端記号の原言語区間の長さの既定上限
pub const DEFAULT_MAX_NONTERMINAL_SPAN: usize = 10;

/// Hiero方式の階層的ルール抽出器
///
/// 原言語パターンの出現を決定的な刻み幅でサンプリングし、出現ごとに
/// 整合する目的言語パターンを構築し、同一の翻訳を集約して素性スコア付きの
/// ルールを出力します。
///
/// コーパス・アラインメント・語彙翻訳確率は `Arc` を介して共有され、
/// 抽出中は読み取り専用です。一回の抽出呼び出しは単一スレッドで同期的に
/// 実行され、抽出器自体は可変な共有状態を持ちません。
pub struct Extractor<C, A, L> {
    source: Arc<C>,
    target: Arc<C>,
    alignments: Arc<A>,
    lexprobs: Arc<L>,
    sample_size: usize,
    max_phrase_span: usize,
    max_phrase_length: usize,
    min_nonterminal_span: usize,
    max_nonterminal_span: usize,
}

/// 一つの翻訳パターンに対する集約値
///
/// 語彙確率の総和は出現ごとの件数と常に同数回加算されるため、
/// 平均の分母には `count` をそのまま使用します。
#[derive(Default)]
struct TranslationStats {
    count: u32,
    sum_source_given_target: f32,
    sum_target_given_source: f32,
}

impl<C, A, L> Extractor<C, A, L>
where
    C: Corpus,
    A: Alignments,
    L: LexicalProbabilities,
{
    /// 新しい抽出器を作成します。
    ///
    /// 各上限値は既定値で初期化されます。変更するには対応するセッターを
    /// 使用してください。
    ///
    /// # 引数
    ///
    /// * `source` - 原言語コーパス
    /// * `target` - 目的言語コーパス
    /// * `alignments` - 単語アラインメント
    /// * `lexprobs` - 語彙翻訳確率
    pub fn new(source: Arc<C>, target: Arc<C>, alignments: Arc<A>, lexprobs: Arc<L>) -> Self {
        Self {
            source,
            target,
            alignments,
            lexprobs,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_phrase_span: DEFAULT_MAX_PHRASE_SPAN,
            max_phrase_length: DEFAULT_MAX_PHRASE_LENGTH,
            min_nonterminal_span: DEFAULT_MIN_NONTERMINAL_SPAN,
            max_nonterminal_span: DEFAULT_MAX_NONTERMINAL_SPAN,
        }
    }

    /// パターンごとに調べる出現数の上限を設定します。
    ///
    /// # エラー
    ///
    /// 値が0の場合、[`HieroError::InvalidArgument`] が返されます。
    pub fn sample_size(mut self, sample_size: usize) -> Result<Self> {
        if sample_size == 0 {
            return Err(HieroError::invalid_argument(
                "sample_size",
                "must be positive",
            ));
        }
        self.sample_size = sample_size;
        Ok(self)
    }

    /// 原言語区間の長さの上限を設定します。
    ///
    /// # エラー
    ///
    /// 値が0の場合、[`HieroError::InvalidArgument`] が返されます。
    pub fn max_phrase_span(mut self, max_phrase_span: usize) -> Result<Self> {
        if max_phrase_span == 0 {
            return Err(HieroError::invalid_argument(
                "max_phrase_span",
                "must be positive",
            ));
        }
        self.max_phrase_span = max_phrase_span;
        Ok(self)
    }

    /// 非終端記号を含まないフレーズの長さの上限を設定します。
    ///
    /// # エラー
    ///
    /// 値が0の場合、[`HieroError::InvalidArgument`] が返されます。
    pub fn max_phrase_length(mut self, max_phrase_length: usize) -> Result<Self> {
        if max_phrase_length == 0 {
            return Err(HieroError::invalid_argument(
                "max_phrase_length",
                "must be positive",
            ));
        }
        self.max_phrase_length = max_phrase_length;
        Ok(self)
    }

    /// 非終端記号の原言語区間の長さの下限を設定します。
    ///
    /// # エラー
    ///
    /// 値が0の場合、または現在の上限を超える場合、
    /// [`HieroError::InvalidArgument`] が返されます。
    pub fn min_nonterminal_span(mut self, min_nonterminal_span: usize) -> Result<Self> {
        if min_nonterminal_span == 0 {
            return Err(HieroError::invalid_argument(
                "min_nonterminal_span",
                "must be positive",
            ));
        }
        if min_nonterminal_span > self.max_nonterminal_span {
            return Err(HieroError::invalid_argument(
                "min_nonterminal_span",
                "must not exceed max_nonterminal_span",
            ));
        }
        self.min_nonterminal_span = min_nonterminal_span;
        Ok(self)
    }

    /// 非終端記号の原言語区間の長さの上限を設定します。
    ///
    /// # エラー
    ///
    /// 値が現在の下限を下回る場合、[`HieroError::InvalidArgument`] が
    /// 返されます。
    pub fn max_nonterminal_span(mut self, max_nonterminal_span: usize) -> Result<Self> {
        if max_nonterminal_span < self.min_nonterminal_span {
            return Err(HieroError::invalid_argument(
                "max_nonterminal_span",
                "must not be less than min_nonterminal_span",
            ));
        }
        self.max_nonterminal_span = max_nonterminal_span;
        Ok(self)
    }

    /// 原言語パターンとその出現記録からルールを抽出します。
    ///
    /// 出現は決定的な刻み幅でサンプリングされます。出現数が
    /// `sample_size` 以下であればすべての出現が調べられ、超える場合は
    /// `⌊N / sample_size⌋` おきに調べられます。翻訳が構築できなかった
    /// 出現は単に寄与しません。
    ///
    /// 同一の目的言語パターンに集約された出現は一つのルールになり、
    /// 素性スコア `[p(e|f), lex_p(e|f), lex_p(f|e)]` が付与されます。
    /// 語彙確率の平均は算術平均です（Chiang 2005に従い、Koehnの最大値では
    /// ありません）。無限大に発散したスコアは [`VERY_UNLIKELY`] に
    /// 丸められます。
    ///
    /// 出力されるルールの順序は不定です。
    ///
    /// # 引数
    ///
    /// * `source_pattern` - 原言語パターン
    /// * `matches` - パターンの出現記録
    ///
    /// # 戻り値
    ///
    /// 抽出されたルールのリスト。翻訳が一つも構築できなかった場合は空です。
    pub fn extract_rules(&self, source_pattern: &Pattern, matches: &MatchedPhrases) -> Vec<Rule> {
        debug!("extracting rules for source pattern: {}", source_pattern);

        let num_occurrences = matches.len();
        let step = if num_occurrences <= self.sample_size {
            1
        } else {
            num_occurrences / self.sample_size
        };

        let mut translations = vec![];
        let mut lex_pairs = vec![];
        let mut occurrence = 0;
        while occurrence < num_occurrences {
            if let Some(translation) = self.translation(matches, occurrence) {
                // Lexical probabilities are looked up per occurrence: even when
                // several occurrences share the same target pattern, their
                // alignment links may differ.
                lex_pairs.push(self.lexprobs.calculate_lex_probs(matches, occurrence));
                translations.push(translation);
            }
            occurrence += step;
        }

        debug!(
            "{} translations of {} being stored",
            translations.len(),
            source_pattern
        );

        let denominator = translations.len() as f64;
        let mut stats: HashMap<Pattern, TranslationStats> = HashMap::new();
        for (translation, (source_given_target, target_given_source)) in
            translations.into_iter().zip(lex_pairs)
        {
            let entry = stats.entry(translation).or_default();
            entry.count += 1;
            entry.sum_source_given_target += source_given_target;
            entry.sum_target_given_source += target_given_source;
        }

        let mut rules = Vec::with_capacity(stats.len());
        for (translation, stat) in &stats {
            let p_e_given_f = clamp_infinite(-((stat.count as f64 / denominator).log10()) as f32);
            let lex_p_e_given_f = clamp_infinite(
                -((stat.sum_source_given_target as f64 / stat.count as f64).log10()) as f32,
            );
            let lex_p_f_given_e = clamp_infinite(
                -((stat.sum_target_given_source as f64 / stat.count as f64).log10()) as f32,
            );
            trace!(
                "prob( {} | {} ) = -log10({} / {}) = {}",
                translation,
                source_pattern,
                stat.count,
                denominator,
                p_e_given_f
            );
            rules.push(Rule::new(
                X,
                source_pattern.word_ids().to_vec(),
                translation.word_ids().to_vec(),
                [p_e_given_f, lex_p_e_given_f, lex_p_f_given_e],
                translation.arity(),
            ));
        }
        rules
    }
}

/// 無限大のスコアを番兵値に丸めます。
#[inline(always)]
fn clamp_infinite(score: f32) -> f32 {
    if score.is_infinite() {
        VERY_UNLIKELY
    } else {
        score
    }
}
