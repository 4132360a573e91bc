//! 収益明細の絞り込み、残高計算、出金額の検証。

use chrono::{DateTime, Local, NaiveDate};
use thiserror::Error;

use crate::{
    backend::models::{TransactionKind, TransactionRow, TransactionStatus},
    history::{TripFilter, within_window},
};

/// 1回あたりの最低出金額（GH₵）。
pub const MIN_WITHDRAWAL: f64 = 10.0;
/// 1回あたりの最高出金額（GH₵）。
pub const MAX_WITHDRAWAL: f64 = 5000.0;
/// 出金画面のクイック入力額。
pub const QUICK_AMOUNTS: [u32; 4] = [50, 100, 200, 300];

/// 画面表示用の明細1件。
#[derive(Clone, Debug, PartialEq)]
pub struct TxRecord {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub created_at: DateTime<Local>,
    pub status: TransactionStatus,
}

impl From<TransactionRow> for TxRecord {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            amount: row.amount,
            description: row.description.unwrap_or_default(),
            created_at: row.created_at.with_timezone(&Local),
            status: row.status,
        }
    }
}

/// 明細の期間フィルタ（本日指定は無い）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxFilter {
    All,
    Week,
    Month,
}

impl TxFilter {
    pub fn label(self) -> &'static str {
        match self {
            TxFilter::All => "All Time",
            TxFilter::Week => "This Week",
            TxFilter::Month => "This Month",
        }
    }

    pub fn next(self) -> Self {
        match self {
            TxFilter::All => TxFilter::Week,
            TxFilter::Week => TxFilter::Month,
            TxFilter::Month => TxFilter::All,
        }
    }

    /// トリップ履歴と同じ期間定義へ対応付ける。
    fn window(self) -> TripFilter {
        match self {
            TxFilter::All => TripFilter::All,
            TxFilter::Week => TripFilter::Week,
            TxFilter::Month => TripFilter::Month,
        }
    }
}

/// 期間で明細を絞り込む。
pub fn filter_transactions(txs: &[TxRecord], filter: TxFilter, today: NaiveDate) -> Vec<&TxRecord> {
    txs.iter()
        .filter(|t| within_window(t.created_at.date_naive(), filter.window(), today))
        .collect()
}

/// 出金可能残高 = 確定済み収益 + 確定済みボーナス − 失敗以外の出金。
pub fn available_balance(txs: &[TxRecord]) -> f64 {
    txs.iter()
        .map(|t| match (t.kind, t.status) {
            (TransactionKind::Earning | TransactionKind::Bonus, TransactionStatus::Completed) => {
                t.amount
            }
            (
                TransactionKind::Withdrawal,
                TransactionStatus::Completed | TransactionStatus::Pending,
            ) => -t.amount,
            _ => 0.0,
        })
        // sum() は空の場合 -0.0 になるため 0.0 から畳み込む。
        .fold(0.0, |acc, v| acc + v)
}

/// 出金額が不正な理由。
#[derive(Debug, Error, PartialEq)]
pub enum WithdrawalError {
    #[error("Please enter an amount")]
    Empty,
    #[error("Please enter a valid amount")]
    Invalid,
    #[error("Insufficient balance. Available: GH₵ {available:.2}")]
    Insufficient { available: f64 },
    #[error("Minimum withdrawal amount is GH₵ 10.00")]
    BelowMinimum,
    #[error("Maximum withdrawal amount is GH₵ 5,000.00 per transaction")]
    AboveMaximum,
}

/// 入力文字列を検証し、出金額を返す。
pub fn validate_withdrawal(input: &str, available: f64) -> Result<f64, WithdrawalError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(WithdrawalError::Empty);
    }
    // 数値でない・0以下・有限でない値はまとめて不正扱い。
    let amount: f64 = input.parse().map_err(|_| WithdrawalError::Invalid)?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(WithdrawalError::Invalid);
    }
    if amount > available {
        return Err(WithdrawalError::Insufficient { available });
    }
    if amount < MIN_WITHDRAWAL {
        return Err(WithdrawalError::BelowMinimum);
    }
    if amount > MAX_WITHDRAWAL {
        return Err(WithdrawalError::AboveMaximum);
    }
    Ok(amount)
}

/// 明細種別の表示名。
pub fn kind_label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Earning => "Earning",
        TransactionKind::Withdrawal => "Withdrawal",
        TransactionKind::Bonus => "Bonus",
    }
}
