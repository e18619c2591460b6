//! 原言語パターンの出現記録
//!
//! このモジュールは、一つの原言語パターンがコーパス中で出現した位置の
//! 集合を保持する[`MatchedPhrases`]を提供します。出現ごとにオブジェクトを
//! 割り当てるのではなく、一つの構造体がすべての出現データを所有し、
//! 利用側は整数の出現インデックスだけを持ち回ります。

use crate::errors::{HieroError, Result};
use crate::pattern::Pattern;
use crate::span::Span;

/// 一つの原言語パターンに対する出現記録の集合
///
/// パターンが非終端記号で始まる（終わる）場合、その開始（終了）位置は
/// 出現記録に含まれません。記録されるのは各終端記号連続列（ラン）の
/// 開始位置のみで、ランの長さはパターンから導出されて全出現で共有されます。
#[derive(Clone, Debug)]
pub struct MatchedPhrases {
    pattern: Pattern,
    run_lengths: Vec<usize>,
    sentences: Vec<usize>,
    run_starts: Vec<usize>,
}

impl MatchedPhrases {
    /// 指定したパターンに対する空の出現記録を作成します。
    ///
    /// # エラー
    ///
    /// パターンが終端記号を一つも含まない場合、または非終端記号が
    /// 隣接している場合、[`HieroError::InvalidArgument`] が返されます。
    pub fn new(pattern: Pattern) -> Result<Self> {
        let words = pattern.word_ids();
        if !words.iter().any(|&w| w >= 0) {
            return Err(HieroError::invalid_argument(
                "pattern",
                "must contain at least one terminal",
            ));
        }
        if words.windows(2).any(|w| w[0] < 0 && w[1] < 0) {
            return Err(HieroError::invalid_argument(
                "pattern",
                "adjacent nonterminals are not allowed",
            ));
        }
        let mut run_lengths = vec![];
        let mut current = 0usize;
        for &w in words {
            if w < 0 {
                if current > 0 {
                    run_lengths.push(current);
                    current = 0;
                }
            } else {
                current += 1;
            }
        }
        if current > 0 {
            run_lengths.push(current);
        }
        Ok(Self {
            pattern,
            run_lengths,
            sentences: vec![],
            run_starts: vec![],
        })
    }

    /// 出現を一件追加します。
    ///
    /// # 引数
    ///
    /// * `sentence` - 出現を含む文の番号
    /// * `starts` - 各終端記号ランのコーパス先頭位置（昇順）
    ///
    /// # エラー
    ///
    /// ランの数がパターンと一致しない場合、またはラン同士が重なる・
    /// 隣接する場合、[`HieroError::InvalidArgument`] が返されます。
    /// 連続するランの間には非終端記号のための間隙が少なくとも1単語分
    /// 必要です。
    pub fn push(&mut self, sentence: usize, starts: &[usize]) -> Result<()> {
        if starts.len() != self.run_lengths.len() {
            return Err(HieroError::invalid_argument(
                "starts",
                format!(
                    "expected {} terminal runs, got {}",
                    self.run_lengths.len(),
                    starts.len()
                ),
            ));
        }
        for k in 0..starts.len().saturating_sub(1) {
            if starts[k + 1] < starts[k] + self.run_lengths[k] + 1 {
                return Err(HieroError::invalid_argument(
                    "starts",
                    "terminal runs must be disjoint and leave a gap for the nonterminal",
                ));
            }
        }
        self.sentences.push(sentence);
        self.run_starts.extend_from_slice(starts);
        Ok(())
    }

    /// 出現の数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// 出現が一件もないかどうかを判定します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// 原言語パターンを返します。
    #[inline(always)]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// パターンの非終端記号の数を返します。
    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.pattern.arity()
    }

    /// パターンが非終端記号で始まるかどうかを判定します。
    #[inline(always)]
    pub fn starts_with_nonterminal(&self) -> bool {
        self.pattern.starts_with_nonterminal()
    }

    /// パターンが非終端記号で終わるかどうかを判定します。
    #[inline(always)]
    pub fn ends_with_nonterminal(&self) -> bool {
        self.pattern.ends_with_nonterminal()
    }

    /// 終端記号ランの数を返します。
    ///
    /// ランの構成はパターンで決まるため、全出現で共通です。
    #[inline(always)]
    pub fn num_terminal_runs(&self) -> usize {
        self.run_lengths.len()
    }

    /// 指定した出現を含む文の番号を返します。
    #[inline(always)]
    pub fn sentence_number(&self, occurrence: usize) -> usize {
        self.sentences[occurrence]
    }

    /// 指定した出現の第kランの先頭位置を返します。
    #[inline(always)]
    pub fn terminal_run_start(&self, occurrence: usize, k: usize) -> usize {
        self.run_starts[occurrence * self.run_lengths.len() + k]
    }

    /// 指定した出現の第kランの終端位置（最後の単語の次）を返します。
    #[inline(always)]
    pub fn terminal_run_end(&self, occurrence: usize, k: usize) -> usize {
        self.terminal_run_start(occurrence, k) + self.run_lengths[k]
    }

    /// 指定した出現の最初の終端記号の位置を返します。
    #[inline(always)]
    pub fn first_terminal_index(&self, occurrence: usize) -> usize {
        self.terminal_run_start(occurrence, 0)
    }

    /// 指定した出現の最後の終端記号の次の位置を返します。
    #[inline(always)]
    pub fn last_terminal_index(&self, occurrence: usize) -> usize {
        self.terminal_run_end(occurrence, self.run_lengths.len() - 1)
    }

    /// 指定した出現の終端記号部分を覆う区間を返します。
    ///
    /// 先頭・末尾の非終端記号は含みません。
    #[inline(always)]
    pub fn span(&self, occurrence: usize) -> Span {
        Span::new(
            self.first_terminal_index(occurrence),
            self.last_terminal_index(occurrence),
        )
    }
}
