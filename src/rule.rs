//! 同期文脈自由文法のルール
//!
//! このモジュールは、抽出結果として出力される文法ルール[`Rule`]を定義します。

use crate::common::WordId;

/// 抽出された同期文脈自由文法のルール `X → ⟨γ, α⟩`
///
/// 素性スコアは `[p(e|f), lex_p(e|f), lex_p(f|e)]` の固定順で、いずれも
/// 負の常用対数に変換された値です。
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    lhs: WordId,
    source: Vec<WordId>,
    target: Vec<WordId>,
    scores: [f32; 3],
    arity: usize,
}

impl Rule {
    /// 新しいルールを作成します。
    pub(crate) fn new(
        lhs: WordId,
        source: Vec<WordId>,
        target: Vec<WordId>,
        scores: [f32; 3],
        arity: usize,
    ) -> Self {
        Self {
            lhs,
            source,
            target,
            scores,
            arity,
        }
    }

    /// 左辺の非終端記号を返します。
    #[inline(always)]
    pub fn lhs(&self) -> WordId {
        self.lhs
    }

    /// 原言語側の単語ID列を返します。
    #[inline(always)]
    pub fn source_word_ids(&self) -> &[WordId] {
        &self.source
    }

    /// 目的言語側の単語ID列を返します。
    #[inline(always)]
    pub fn target_word_ids(&self) -> &[WordId] {
        &self.target
    }

    /// 素性スコアを返します。
    ///
    /// 順序は `[p(e|f), lex_p(e|f), lex_p(f|e)]` です。
    #[inline(always)]
    pub fn scores(&self) -> &[f32; 3] {
        &self.scores
    }

    /// 非終端記号の数を返します。
    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.arity
    }
}
