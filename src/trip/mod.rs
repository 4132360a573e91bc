//! 集荷リクエストの受諾からトリップ完了までの状態管理。

/// 進行中トリップ。
pub mod active;
/// カウントダウンタイマー。
pub mod countdown;
/// 処分場の選択。
pub mod disposal;
/// 受諾/辞退ゲート。
pub mod gate;
/// リクエストのモデル。
pub mod request;
/// ステータス遷移。
pub mod stepper;
/// 完了時の要約。
pub mod summary;
