//! 階層的フレーズのパターン表現
//!
//! このモジュールは、終端記号と非終端記号が混在した単語ID列を表す
//! [`Pattern`]を提供します。パターンは原言語側の検索キーとしても、
//! 抽出された目的言語側の翻訳としても使用されます。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::common::WordId;
use crate::vocabulary::Vocabulary;

/// 終端記号と非終端記号が混在した単語ID列
///
/// 負のIDは非終端記号を、非負のIDは語彙表に登録された終端記号を表します。
/// 等価性とハッシュ値は単語ID列のみで決まり、語彙表のハンドルは比較に
/// 関与しません。
#[derive(Clone, Debug)]
pub struct Pattern {
    words: Vec<WordId>,
    vocab: Arc<Vocabulary>,
}

impl Pattern {
    /// 新しいパターンを作成します。
    ///
    /// # 引数
    ///
    /// * `vocab` - 終端記号の解決に使用する語彙表
    /// * `words` - 単語ID列
    pub fn new(vocab: Arc<Vocabulary>, words: Vec<WordId>) -> Self {
        Self { words, vocab }
    }

    /// 単語ID列を返します。
    #[inline(always)]
    pub fn word_ids(&self) -> &[WordId] {
        &self.words
    }

    /// 語彙表のハンドルを返します。
    #[inline(always)]
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// パターンの長さ（終端記号と非終端記号の総数）を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// パターンが空かどうかを判定します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// 非終端記号の数を返します。
    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.words.iter().filter(|&&w| w < 0).count()
    }

    /// パターンが非終端記号で始まるかどうかを判定します。
    #[inline(always)]
    pub fn starts_with_nonterminal(&self) -> bool {
        matches!(self.words.first(), Some(&w) if w < 0)
    }

    /// パターンが非終端記号で終わるかどうかを判定します。
    #[inline(always)]
    pub fn ends_with_nonterminal(&self) -> bool {
        matches!(self.words.last(), Some(&w) if w < 0)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words.hash(state);
    }
}

impl fmt::Display for Pattern {
    /// ログ出力用の表記を書き出します。
    ///
    /// 終端記号は語彙表で解決され、非終端記号は `[X,n]` と表記されます。
    /// 文法ファイルのフォーマットではありません。
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, &w) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if w < 0 {
                write!(f, "[X,{}]", -w)?;
            } else {
                write!(f, "{}", self.vocab.word(w).unwrap_or("<unk>"))?;
            }
        }
        Ok(())
    }
}
