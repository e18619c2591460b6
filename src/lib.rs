//! # Hiero
//!
//! Hieroは、階層的フレーズベース統計的機械翻訳のための同期文脈自由文法
//! ルール抽出器の実装です。
//!
//! ## 概要
//!
//! このライブラリは、単語アラインメント付きの対訳コーパスから
//! `X → ⟨γ, α⟩` の形の同期文脈自由文法ルールを抽出します。原言語パターン
//! （終端記号と非終端記号の混在列）とコーパス中の出現位置の集合を受け取り、
//! 出現を決定的にサンプリングし、アラインメントに整合する目的言語パターンを
//! 構築し、同一の翻訳を集約して三つの素性スコア（翻訳確率と二方向の
//! 語彙翻訳確率、いずれも負の常用対数）を付与します。
//!
//! ## 主な機能
//!
//! - **整合区間の解決**: アラインメントの閉包に基づく最小整合区間の計算
//! - **四つの境界場合の処理**: パターン先頭・末尾の非終端記号に応じた候補区間の走査
//! - **決定的サンプリング**: 乱数を用いない刻み幅ベースの出現サンプリング
//! - **翻訳の集約**: 同一翻訳の併合と算術平均による語彙確率の平均化（Chiang 2005）
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use hiero::{AlignmentGrid, Corpus, CorpusArray, Extractor, LexProbTable, MatchedPhrases, Pattern};
//!
//! let source = Arc::new(CorpusArray::from_sentences(&["watashi wa gakkou ni iku"]));
//! let target = Arc::new(CorpusArray::from_sentences(&["i go to school"]));
//! let alignments = Arc::new(AlignmentGrid::from_pharaoh(
//!     source.as_ref(),
//!     target.as_ref(),
//!     &["0-0 4-1 3-2 2-3"],
//! )?);
//! let lexprobs = Arc::new(LexProbTable::new(
//!     source.clone(),
//!     target.clone(),
//!     alignments.clone(),
//! ));
//! let extractor = Extractor::new(source.clone(), target.clone(), alignments, lexprobs);
//!
//! let vocab = source.vocabulary().clone();
//! let pattern = Pattern::new(
//!     vocab.clone(),
//!     vec![vocab.id("gakkou").unwrap(), vocab.id("ni").unwrap()],
//! );
//! let mut matches = MatchedPhrases::new(pattern.clone())?;
//! matches.push(0, &[2])?;
//!
//! let rules = extractor.extract_rules(&pattern, &matches);
//! assert_eq!(rules.len(), 1);
//!
//! let to = target.vocabulary().id("to").unwrap();
//! let school = target.vocabulary().id("school").unwrap();
//! assert_eq!(rules[0].target_word_ids(), &[to, school]);
//! # Ok(())
//! # }
//! ```

/// 単語アラインメント
pub mod alignment;

/// 共通の型定義と文法定数
pub mod common;

/// コーパスの表現
pub mod corpus;

/// エラー型の定義
pub mod errors;

/// ルール抽出器の実装
pub mod extractor;

/// 語彙翻訳確率
pub mod lexprob;

/// 階層的フレーズのパターン表現
pub mod pattern;

/// 原言語パターンの出現記録
pub mod phrases;

/// 同期文法ルール
pub mod rule;

/// コーパス位置区間
pub mod span;

/// 語彙表
pub mod vocabulary;

#[cfg(test)]
mod test_utils;

// Re-exports
pub use alignment::{AlignmentGrid, Alignments};
pub use common::{WordId, VERY_UNLIKELY, X};
pub use corpus::{Corpus, CorpusArray};
pub use extractor::Extractor;
pub use lexprob::{LexProbTable, LexicalProbabilities};
pub use pattern::Pattern;
pub use phrases::MatchedPhrases;
pub use rule::Rule;
pub use span::{LabeledSpan, Span};
pub use vocabulary::Vocabulary;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
