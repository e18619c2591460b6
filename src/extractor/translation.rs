//! 目的言語パターンの構築
//!
//! このモジュールは、一つの出現に対して整合する目的言語区間を解決し、
//! 原言語の非終端記号に対応する位置へラベルを配置した目的言語パターンを
//! 構築するルーチンを提供します。
//!
//! 処理は四つの場合に分かれます。パターンが非終端記号で始まる（終わる）
//! 場合、その開始（終了）位置は出現記録に保存されていないため、文境界と
//! 各上限値の範囲内で候補区間を走査する必要があります。

use log::trace;

use crate::alignment::Alignments;
use crate::common::WordId;
use crate::corpus::Corpus;
use crate::extractor::Extractor;
use crate::lexprob::LexicalProbabilities;
use crate::pattern::Pattern;
use crate::phrases::MatchedPhrases;
use crate::span::{LabeledSpan, Span};

impl<C, A, L> Extractor<C, A, L>
where
    C: Corpus,
    A: Alignments,
    L: LexicalProbabilities,
{
    /// 指定した出現に対する目的言語パターンを構築します。
    ///
    /// 候補となる原言語区間を定義順に走査し、最初に構築に成功した
    /// パターンを返します。どの候補でも構築できない場合は `None` を
    /// 返します。
    pub(crate) fn translation(
        &self,
        phrases: &MatchedPhrases,
        occurrence: usize,
    ) -> Option<Pattern> {
        let starts_with_nt = phrases.starts_with_nonterminal();
        let ends_with_nt = phrases.ends_with_nonterminal();

        if !starts_with_nt && !ends_with_nt {
            // Case 1: the occurrence span is known exactly.
            trace!("case 1: source phrase neither starts nor ends with a nonterminal");
            let source_span = phrases.span(occurrence);
            let target_span = self.alignments.consistent_target_span(source_span)?;
            if self.accepts_target_span(phrases, target_span) {
                return self.construct_translation(
                    phrases,
                    occurrence,
                    source_span,
                    target_span,
                    false,
                    false,
                );
            }
            None
        } else if starts_with_nt && !ends_with_nt {
            // Case 2: scan leftwards for the start of the leading nonterminal.
            trace!("case 2: source phrase starts with a nonterminal");
            let sentence = phrases.sentence_number(occurrence);
            let sentence_start = self.source.sentence_position(sentence);
            let first_terminal = phrases.first_terminal_index(occurrence);
            let last_terminal = phrases.last_terminal_index(occurrence);
            let lowest_start = sentence_start
                .max(first_terminal.saturating_sub(self.max_nonterminal_span))
                .max(last_terminal.saturating_sub(self.max_phrase_span));
            for span_start in (lowest_start..first_terminal).rev() {
                let source_span = Span::new(span_start, last_terminal);
                if let Some(target_span) = self.alignments.consistent_target_span(source_span) {
                    if self.accepts_target_span(phrases, target_span) {
                        if let Some(translation) = self.construct_translation(
                            phrases,
                            occurrence,
                            source_span,
                            target_span,
                            true,
                            false,
                        ) {
                            return Some(translation);
                        }
                    }
                }
            }
            None
        } else if !starts_with_nt && ends_with_nt {
            // Case 3: scan rightwards for the end of the trailing nonterminal.
            trace!("case 3: source phrase ends with a nonterminal");
            let sentence = phrases.sentence_number(occurrence);
            let sentence_end = self.source.sentence_end_position(sentence);
            let first_terminal = phrases.first_terminal_index(occurrence);
            let last_terminal = phrases.last_terminal_index(occurrence);
            let highest_end = sentence_end
                .min(last_terminal + self.max_nonterminal_span)
                .min(first_terminal + self.max_phrase_span);
            for span_end in (last_terminal + 1)..=highest_end {
                let source_span = Span::new(first_terminal, span_end);
                if let Some(target_span) = self.alignments.consistent_target_span(source_span) {
                    if self.accepts_target_span(phrases, target_span) {
                        if let Some(translation) = self.construct_translation(
                            phrases,
                            occurrence,
                            source_span,
                            target_span,
                            false,
                            true,
                        ) {
                            return Some(translation);
                        }
                    }
                }
            }
            None
        } else {
            // Case 4: both ends are open; sweep the candidate spans row-major,
            // widening the end before retreating the start.
            trace!("case 4: source phrase starts and ends with a nonterminal");
            let sentence = phrases.sentence_number(occurrence);
            let sentence_start = self.source.sentence_position(sentence);
            let sentence_end = self.source.sentence_end_position(sentence);
            let first_terminal = phrases.first_terminal_index(occurrence);
            let last_terminal = phrases.last_terminal_index(occurrence);
            if first_terminal <= sentence_start {
                return None;
            }
            let mut span_start = first_terminal - 1;
            let mut span_end = last_terminal + 1;
            while span_start >= sentence_start
                && span_end <= sentence_end
                && first_terminal - span_start <= self.max_nonterminal_span
                && span_end - last_terminal <= self.max_nonterminal_span
                && span_end - span_start <= self.max_phrase_span
            {
                let source_span = Span::new(span_start, span_end);
                if let Some(target_span) = self.alignments.consistent_target_span(source_span) {
                    if self.accepts_target_span(phrases, target_span) {
                        if let Some(translation) = self.construct_translation(
                            phrases,
                            occurrence,
                            source_span,
                            target_span,
                            true,
                            true,
                        ) {
                            return Some(translation);
                        }
                    }
                }
                if span_end < sentence_end
                    && span_end - last_terminal + 1 <= self.max_nonterminal_span
                    && span_end - span_start + 1 <= self.max_phrase_span
                {
                    span_end += 1;
                } else if span_start == 0 {
                    break;
                } else {
                    span_end = last_terminal + 1;
                    span_start -= 1;
                }
            }
            None
        }
    }

    /// 目的言語区間が受理条件を満たすかどうかを判定します。
    ///
    /// 区間は各非終端記号と少なくとも一つの終端記号を収められる長さを
    /// 持ち、かつフレーズ長の上限を超えてはなりません。
    #[inline(always)]
    fn accepts_target_span(&self, phrases: &MatchedPhrases, target_span: Span) -> bool {
        target_span.size() >= phrases.arity() + 1 && target_span.size() <= self.max_phrase_span
    }

    /// 確定した原言語・目的言語区間の組から目的言語パターンを構築します。
    ///
    /// 原言語の各非終端記号に対応する整合した目的言語区間を解決し、
    /// 目的言語側の位置順に `-1, -2, …` のラベルを並べ替えて配置します。
    /// 出力されるラベル列は原言語と目的言語の間の並べ替えを表します。
    ///
    /// 次のいずれかに該当する場合、構築は失敗して `None` を返します。
    ///
    /// - 原言語区間がフレーズ長の上限を超える
    /// - いずれかの非終端記号の原言語区間が下限より短い
    /// - いずれかの非終端記号の目的言語区間が解決できない、または
    ///   目的言語区間全体と一致する
    /// - 非終端記号の区間が目的言語区間を覆い尽くし、終端記号の余地がない
    /// - 構築されたパターンの終端記号位置がどれも原言語の終端記号列へ
    ///   アラインされていない
    pub(crate) fn construct_translation(
        &self,
        phrases: &MatchedPhrases,
        occurrence: usize,
        source_span: Span,
        target_span: Span,
        source_starts_with_nt: bool,
        source_ends_with_nt: bool,
    ) -> Option<Pattern> {
        trace!(
            "constructing translation for source span {}, target span {}",
            source_span,
            target_span
        );

        if source_span.size() > self.max_phrase_span {
            return None;
        }

        // The trivial case without nonterminals copies the target words as-is.
        if phrases.arity() == 0 {
            if source_span.size() > self.max_phrase_length {
                return None;
            }
            let words = target_span
                .positions()
                .map(|position| self.target.word_id(position))
                .collect();
            return Some(Pattern::new(self.target.vocabulary().clone(), words));
        }

        let mut target_nt_spans: Vec<LabeledSpan> = vec![];
        let mut pattern_size = target_span.size();
        let mut label = -1;

        if source_starts_with_nt {
            let first_terminal = phrases.first_terminal_index(occurrence);
            if first_terminal - source_span.start < self.min_nonterminal_span {
                return None;
            }
            let nt_source_span = Span::new(source_span.start, first_terminal);
            let nt_target_span = self.alignments.consistent_target_span(nt_source_span)?;
            if nt_target_span == target_span {
                return None;
            }
            // The emitted pattern shrinks by the nonterminal span, which
            // collapses into a single label.
            pattern_size = (pattern_size + 1).saturating_sub(nt_target_span.size());
            target_nt_spans.push(LabeledSpan::new(label, nt_target_span));
            label -= 1;
        }

        for k in 0..phrases.num_terminal_runs() - 1 {
            let current_end = phrases.terminal_run_end(occurrence, k);
            let next_start = phrases.terminal_run_start(occurrence, k + 1);
            if next_start - current_end < self.min_nonterminal_span {
                return None;
            }
            let nt_source_span = Span::new(current_end, next_start);
            let nt_target_span = self.alignments.consistent_target_span(nt_source_span)?;
            if nt_target_span == target_span {
                return None;
            }
            pattern_size = (pattern_size + 1).saturating_sub(nt_target_span.size());
            target_nt_spans.push(LabeledSpan::new(label, nt_target_span));
            label -= 1;
        }

        if source_ends_with_nt {
            let last_terminal = phrases.last_terminal_index(occurrence);
            if source_span.end - last_terminal < self.min_nonterminal_span {
                return None;
            }
            let nt_source_span = Span::new(last_terminal, source_span.end);
            let nt_target_span = self.alignments.consistent_target_span(nt_source_span)?;
            if nt_target_span == target_span {
                return None;
            }
            pattern_size = (pattern_size + 1).saturating_sub(nt_target_span.size());
            target_nt_spans.push(LabeledSpan::new(label, nt_target_span));
        }

        // Labels were assigned in source order; sorting arranges them by
        // target position, which encodes the reordering permutation.
        target_nt_spans.sort_unstable();

        let mut words: Vec<WordId> = Vec::with_capacity(pattern_size);
        let mut found_aligned_terminal = false;

        if target_nt_spans[0].span.start == target_span.start {
            let nt_cumulative_span: usize = target_nt_spans.iter().map(LabeledSpan::size).sum();
            if nt_cumulative_span >= target_span.size() {
                // no room for a single aligned terminal
                return None;
            }
        } else {
            self.emit_terminals(
                phrases,
                occurrence,
                target_span.start,
                target_nt_spans[0].span.start,
                &mut words,
                &mut found_aligned_terminal,
            );
        }

        words.push(target_nt_spans[0].label);

        for k in 1..target_nt_spans.len() {
            self.emit_terminals(
                phrases,
                occurrence,
                target_nt_spans[k - 1].span.end,
                target_nt_spans[k].span.start,
                &mut words,
                &mut found_aligned_terminal,
            );
            words.push(target_nt_spans[k].label);
        }

        let last_nt_end = target_nt_spans[target_nt_spans.len() - 1].span.end;
        if last_nt_end != target_span.end {
            self.emit_terminals(
                phrases,
                occurrence,
                last_nt_end,
                target_span.end,
                &mut words,
                &mut found_aligned_terminal,
            );
        }

        if !found_aligned_terminal {
            trace!("candidate translation contains no aligned terminal");
            return None;
        }
        debug_assert_eq!(words.len(), pattern_size);
        Some(Pattern::new(self.target.vocabulary().clone(), words))
    }

    /// 目的言語の単語IDを書き出し、アラインされた終端記号の有無を記録します。
    fn emit_terminals(
        &self,
        phrases: &MatchedPhrases,
        occurrence: usize,
        from: usize,
        to: usize,
        words: &mut Vec<WordId>,
        found_aligned_terminal: &mut bool,
    ) {
        for position in from..to {
            if !*found_aligned_terminal {
                *found_aligned_terminal =
                    self.alignments
                        .has_aligned_terminal(position, phrases, occurrence);
            }
            words.push(self.target.word_id(position));
        }
    }
}
