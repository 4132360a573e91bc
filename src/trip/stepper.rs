//! 進行中トリップのステータス遷移。
//!
//! 5つのマイルストーンを前方へ1つずつだけ進める。最後の状態からの
//! `advance` はトリップ完了であり、6番目の状態は存在しない。

/// トリップのマイルストーン。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TripStatus {
    /// 集荷先へ移動中。
    DrivingToPickup,
    /// 集荷先に到着。
    ArrivedAtPickup,
    /// 廃棄物を回収済み。
    WasteCollected,
    /// 処分場へ移動中。
    DrivingToDisposal,
    /// 処分場に到着。
    ArrivedAtDisposal,
}

impl TripStatus {
    /// 遷移順の一覧。
    pub const ALL: [TripStatus; 5] = [
        TripStatus::DrivingToPickup,
        TripStatus::ArrivedAtPickup,
        TripStatus::WasteCollected,
        TripStatus::DrivingToDisposal,
        TripStatus::ArrivedAtDisposal,
    ];

    /// 0始まりの順序。
    pub fn index(self) -> usize {
        match self {
            TripStatus::DrivingToPickup => 0,
            TripStatus::ArrivedAtPickup => 1,
            TripStatus::WasteCollected => 2,
            TripStatus::DrivingToDisposal => 3,
            TripStatus::ArrivedAtDisposal => 4,
        }
    }

    /// 次の状態。最後の状態ならNone。
    pub fn next(self) -> Option<TripStatus> {
        match self {
            TripStatus::DrivingToPickup => Some(TripStatus::ArrivedAtPickup),
            TripStatus::ArrivedAtPickup => Some(TripStatus::WasteCollected),
            TripStatus::WasteCollected => Some(TripStatus::DrivingToDisposal),
            TripStatus::DrivingToDisposal => Some(TripStatus::ArrivedAtDisposal),
            TripStatus::ArrivedAtDisposal => None,
        }
    }

    /// 永続化・ログ用のキー。
    pub fn key(self) -> &'static str {
        match self {
            TripStatus::DrivingToPickup => "driving_to_pickup",
            TripStatus::ArrivedAtPickup => "arrived_at_pickup",
            TripStatus::WasteCollected => "waste_collected",
            TripStatus::DrivingToDisposal => "driving_to_disposal",
            TripStatus::ArrivedAtDisposal => "arrived_at_disposal",
        }
    }

    /// 進捗一覧に出す表示名。
    pub fn label(self) -> &'static str {
        match self {
            TripStatus::DrivingToPickup => "Driving to Pickup",
            TripStatus::ArrivedAtPickup => "Arrived at Pickup",
            TripStatus::WasteCollected => "Waste Collected",
            TripStatus::DrivingToDisposal => "Driving to Disposal",
            TripStatus::ArrivedAtDisposal => "Arrived at Disposal",
        }
    }

    /// この状態で押すアクションボタンの文言。
    pub fn action_label(self) -> &'static str {
        match self.next() {
            Some(next) => next.label(),
            None => "Complete Trip",
        }
    }

    /// 処分場を選べる状態か。
    pub fn allows_disposal_selection(self) -> bool {
        matches!(
            self,
            TripStatus::WasteCollected | TripStatus::DrivingToDisposal
        )
    }
}

/// 各ステップの表示状態。保存せず現在位置から導出する。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

/// `advance` の結果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// 次の状態へ進んだ。
    Advanced(TripStatus),
    /// 最後の状態からトリップを完了した。
    TripCompleted,
    /// 完了後の呼び出しで、何も変化していない。
    Ignored,
}

/// ステータスの前進だけを許す状態機械。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripStepper {
    /// 現在の状態。
    current: TripStatus,
    /// 完了済みか。
    finished: bool,
}

impl TripStepper {
    /// 最初の状態で初期化する。
    pub fn new() -> Self {
        Self {
            current: TripStatus::DrivingToPickup,
            finished: false,
        }
    }

    /// 最初の状態へ戻す（新しいトリップ開始時）。
    pub fn initialize(&mut self) {
        *self = Self::new();
    }

    /// 1ステップ進める。唯一の更新操作。
    pub fn advance(&mut self) -> StepOutcome {
        // 完了後の呼び出しは不変条件違反。開発時は即座に落とす。
        if self.finished {
            tracing::error!("advance called on a completed trip");
            debug_assert!(!self.finished, "advance called on a completed trip");
            return StepOutcome::Ignored;
        }
        match self.current.next() {
            Some(next) => {
                tracing::info!("trip status: {} -> {}", self.current.key(), next.key());
                self.current = next;
                StepOutcome::Advanced(next)
            }
            None => {
                tracing::info!("trip completed from {}", self.current.key());
                self.finished = true;
                StepOutcome::TripCompleted
            }
        }
    }

    pub fn current(&self) -> TripStatus {
        self.current
    }

    pub fn current_index(&self) -> usize {
        self.current.index()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 現在の状態の表示名。
    pub fn current_label(&self) -> &'static str {
        self.current.label()
    }

    /// アクションボタンの文言。
    pub fn action_label(&self) -> &'static str {
        self.current.action_label()
    }

    /// i番目のステップの表示状態。
    pub fn step_state(&self, i: usize) -> StepState {
        let current = self.current_index();
        if i < current {
            StepState::Completed
        } else if i == current {
            StepState::Current
        } else {
            StepState::Pending
        }
    }

    pub fn is_step_completed(&self, i: usize) -> bool {
        self.step_state(i) == StepState::Completed
    }

    pub fn is_step_current(&self, i: usize) -> bool {
        self.step_state(i) == StepState::Current
    }

    pub fn is_step_pending(&self, i: usize) -> bool {
        self.step_state(i) == StepState::Pending
    }
}

impl Default for TripStepper {
    fn default() -> Self {
        Self::new()
    }
}
