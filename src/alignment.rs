//! 単語アラインメント
//!
//! このモジュールは、原言語と目的言語の単語位置の対応関係を照会する
//! [`Alignments`]トレイトと、リンク集合をインメモリで保持する
//! [`AlignmentGrid`]を提供します。
//!
//! 抽出器が必要とする照会は二つだけです。一つは原言語区間に整合する
//! 最小の目的言語区間の解決、もう一つは目的言語位置が出現の終端記号
//! ランへアラインされているかどうかの判定です。

use crate::corpus::Corpus;
use crate::errors::{HieroError, Result};
use crate::phrases::MatchedPhrases;
use crate::span::Span;

/// アラインメントの照会インタフェース
pub trait Alignments: Send + Sync {
    /// 原言語区間に整合する最小の目的言語区間を返します。
    ///
    /// 返される区間は次の三条件を満たします。原言語区間内のすべての
    /// リンクが目的言語区間内に着地すること、目的言語区間内のすべての
    /// リンクが原言語区間内に着地すること、および区間が空でないことです。
    /// そのような区間が存在しない場合は `None` を返します。
    fn consistent_target_span(&self, source_span: Span) -> Option<Span>;

    /// 目的言語位置が出現の終端記号ランへアラインされているかを判定します。
    ///
    /// 指定した目的言語位置から出るリンクのうち、少なくとも一つが
    /// 出現 `occurrence` のいずれかの終端記号ランの内部に着地する場合に
    /// `true` を返します。
    fn has_aligned_terminal(
        &self,
        target_position: usize,
        phrases: &MatchedPhrases,
        occurrence: usize,
    ) -> bool;
}

/// 双方向のリンク表によるアラインメントの実装
///
/// リンクはコーパス全体の位置で保持されます。各位置のリンク先リストは
/// 昇順です。
#[derive(Clone, Debug, Default)]
pub struct AlignmentGrid {
    source_links: Vec<Vec<usize>>,
    target_links: Vec<Vec<usize>>,
}

impl AlignmentGrid {
    /// リンクの組からアラインメント表を作成します。
    ///
    /// # 引数
    ///
    /// * `source_len` - 原言語コーパスの単語数
    /// * `target_len` - 目的言語コーパスの単語数
    /// * `links` - `(原言語位置, 目的言語位置)` の組
    ///
    /// # エラー
    ///
    /// いずれかの位置がコーパス長を超える場合、
    /// [`HieroError::InvalidArgument`] が返されます。
    pub fn from_links<I>(source_len: usize, target_len: usize, links: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut grid = Self {
            source_links: vec![vec![]; source_len],
            target_links: vec![vec![]; target_len],
        };
        for (s, t) in links {
            if s >= source_len || t >= target_len {
                return Err(HieroError::invalid_argument(
                    "links",
                    format!("link {}-{} is out of corpus bounds", s, t),
                ));
            }
            grid.source_links[s].push(t);
            grid.target_links[t].push(s);
        }
        for list in grid
            .source_links
            .iter_mut()
            .chain(grid.target_links.iter_mut())
        {
            list.sort_unstable();
            list.dedup();
        }
        Ok(grid)
    }

    /// Pharaoh形式のアラインメント行からアラインメント表を作成します。
    ///
    /// 各行は一文に対応し、`i-j` の形のリンクを空白区切りで並べたものです。
    /// `i` と `j` は文内の位置で、両コーパスの文オフセットを用いて
    /// コーパス全体の位置へ変換されます。
    ///
    /// # エラー
    ///
    /// 行数が文数と一致しない場合は [`HieroError::InvalidArgument`] が、
    /// リンクの形式が不正な場合は [`HieroError::InvalidFormat`] が
    /// 返されます。
    pub fn from_pharaoh<C, S>(source: &C, target: &C, lines: &[S]) -> Result<Self>
    where
        C: Corpus,
        S: AsRef<str>,
    {
        if lines.len() != source.num_sentences() {
            return Err(HieroError::invalid_argument(
                "lines",
                format!(
                    "expected {} alignment lines, got {}",
                    source.num_sentences(),
                    lines.len()
                ),
            ));
        }
        let mut links = vec![];
        for (sentence, line) in lines.iter().enumerate() {
            let source_offset = source.sentence_position(sentence);
            let target_offset = target.sentence_position(sentence);
            let source_end = source.sentence_end_position(sentence);
            let target_end = target.sentence_end_position(sentence);
            for token in line.as_ref().split_whitespace() {
                let (i, j) = token.split_once('-').ok_or_else(|| {
                    HieroError::invalid_format("alignment", format!("bad link token '{}'", token))
                })?;
                let i: usize = i.parse()?;
                let j: usize = j.parse()?;
                let s = source_offset + i;
                let t = target_offset + j;
                if s >= source_end || t >= target_end {
                    return Err(HieroError::invalid_format(
                        "alignment",
                        format!("link {}-{} exceeds sentence {} length", i, j, sentence),
                    ));
                }
                links.push((s, t));
            }
        }
        Self::from_links(source.len(), target.len(), links)
    }

    /// 指定した原言語位置のリンク先リストを返します。
    #[inline(always)]
    pub fn aligned_targets(&self, source_position: usize) -> &[usize] {
        &self.source_links[source_position]
    }

    /// 指定した目的言語位置のリンク元リストを返します。
    #[inline(always)]
    pub fn aligned_sources(&self, target_position: usize) -> &[usize] {
        &self.target_links[target_position]
    }
}

impl Alignments for AlignmentGrid {
    fn consistent_target_span(&self, source_span: Span) -> Option<Span> {
        let mut min = usize::MAX;
        let mut max = 0;
        for s in source_span.positions() {
            for &t in &self.source_links[s] {
                min = min.min(t);
                max = max.max(t);
            }
        }
        if min == usize::MAX {
            // unaligned source spans have no consistent translation
            return None;
        }
        let target_span = Span::new(min, max + 1);
        for t in target_span.positions() {
            for &s in &self.target_links[t] {
                if s < source_span.start || s >= source_span.end {
                    return None;
                }
            }
        }
        Some(target_span)
    }

    fn has_aligned_terminal(
        &self,
        target_position: usize,
        phrases: &MatchedPhrases,
        occurrence: usize,
    ) -> bool {
        for &s in &self.target_links[target_position] {
            for k in 0..phrases.num_terminal_runs() {
                if s >= phrases.terminal_run_start(occurrence, k)
                    && s < phrases.terminal_run_end(occurrence, k)
                {
                    return true;
                }
            }
        }
        false
    }
}
