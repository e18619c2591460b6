//! 共通の型定義と文法定数

/// コーパスおよびパターン中の単語を表す識別子
///
/// 非負の値は終端記号（語彙中の具体的な単語）を、負の値は非終端記号を表します。
pub type WordId = i32;

/// 文法の左辺に使用される唯一の非終端記号 `X`
pub const X: WordId = -1;

/// `+∞` の対数確率の代わりに使用される有限の番兵値
///
/// `-log10(1e-10)` に相当します。語彙確率の総和がゼロになった場合など、
/// 素性スコアが無限大に発散したときにこの値へ丸められます。
pub const VERY_UNLIKELY: f32 = 10.0;
