//! コーパスの表現
//!
//! このモジュールは、抽出器が参照するコーパスの抽象インタフェースである
//! [`Corpus`]トレイトと、そのインメモリ実装である[`CorpusArray`]を提供します。
//! コーパスは全文書を連結した単語ID列として保持され、位置は文を跨いで
//! 連続する整数で表されます。

use std::sync::Arc;

use crate::common::WordId;
use crate::errors::{HieroError, Result};
use crate::vocabulary::Vocabulary;

/// 単語IDの列と文境界を公開するコーパスのインタフェース
///
/// 抽出処理の間、コーパスは読み取り専用です。実装はスレッド間で共有できる
/// よう `Send + Sync` であることが求められます。
pub trait Corpus: Send + Sync {
    /// コーパス全体の単語数を返します。
    fn len(&self) -> usize;

    /// コーパスが空かどうかを判定します。
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 指定位置の単語IDを返します。
    fn word_id(&self, position: usize) -> WordId;

    /// 文の数を返します。
    fn num_sentences(&self) -> usize;

    /// 指定した文の先頭位置を返します。
    fn sentence_position(&self, sentence: usize) -> usize;

    /// 指定した文の終端位置（最後の単語の次の位置）を返します。
    fn sentence_end_position(&self, sentence: usize) -> usize;

    /// 語彙表のハンドルを返します。
    fn vocabulary(&self) -> &Arc<Vocabulary>;
}

/// 連結された単語ID列と文オフセットによるコーパスの実装
#[derive(Clone, Debug)]
pub struct CorpusArray {
    words: Vec<WordId>,
    sentence_offsets: Vec<usize>,
    vocab: Arc<Vocabulary>,
}

impl CorpusArray {
    /// 構成要素からコーパスを作成します。
    ///
    /// # 引数
    ///
    /// * `words` - 全文を連結した単語ID列
    /// * `sentence_offsets` - 各文の先頭位置。先頭は0、以降は単調非減少
    /// * `vocab` - 語彙表
    ///
    /// # エラー
    ///
    /// 文オフセットが0から始まらない、単調性に違反する、または単語ID列の
    /// 範囲を超える場合、[`HieroError::InvalidArgument`] が返されます。
    pub fn new(
        words: Vec<WordId>,
        sentence_offsets: Vec<usize>,
        vocab: Arc<Vocabulary>,
    ) -> Result<Self> {
        if sentence_offsets.first() != Some(&0) {
            return Err(HieroError::invalid_argument(
                "sentence_offsets",
                "must start at position 0",
            ));
        }
        for pair in sentence_offsets.windows(2) {
            if pair[0] > pair[1] {
                return Err(HieroError::invalid_argument(
                    "sentence_offsets",
                    "must be monotonically non-decreasing",
                ));
            }
        }
        if let Some(&last) = sentence_offsets.last() {
            if last > words.len() {
                return Err(HieroError::invalid_argument(
                    "sentence_offsets",
                    "must not exceed the corpus length",
                ));
            }
        }
        Ok(Self {
            words,
            sentence_offsets,
            vocab,
        })
    }

    /// トークン化済みの文からコーパスと語彙表を構築します。
    ///
    /// 各文は空白区切りのトークン列として与えます。語彙表は出現順に
    /// 構築されます。
    pub fn from_sentences<S>(sentences: &[S]) -> Self
    where
        S: AsRef<str>,
    {
        let mut vocab = Vocabulary::new();
        let mut words = vec![];
        let mut sentence_offsets = vec![];
        for sentence in sentences {
            sentence_offsets.push(words.len());
            for token in sentence.as_ref().split_whitespace() {
                words.push(vocab.add(token));
            }
        }
        Self {
            words,
            sentence_offsets,
            vocab: Arc::new(vocab),
        }
    }
}

impl Corpus for CorpusArray {
    #[inline(always)]
    fn len(&self) -> usize {
        self.words.len()
    }

    #[inline(always)]
    fn word_id(&self, position: usize) -> WordId {
        self.words[position]
    }

    #[inline(always)]
    fn num_sentences(&self) -> usize {
        self.sentence_offsets.len()
    }

    #[inline(always)]
    fn sentence_position(&self, sentence: usize) -> usize {
        self.sentence_offsets[sentence]
    }

    #[inline(always)]
    fn sentence_end_position(&self, sentence: usize) -> usize {
        self.sentence_offsets
            .get(sentence + 1)
            .copied()
            .unwrap_or(self.words.len())
    }

    #[inline(always)]
    fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }
}
