use serde::{Deserialize, Serialize};

/// Plant stages in physical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageName {
    Batching,
    FerryCart,
    Tilting,
    Cutting,
    Autoclave,
    Segregation,
}

impl StageName {
    pub const ALL: [StageName; 6] = [
        StageName::Batching,
        StageName::FerryCart,
        StageName::Tilting,
        StageName::Cutting,
        StageName::Autoclave,
        StageName::Segregation,
    ];

    /// The stage a batch moves to after this one.
    pub fn next(&self) -> Option<StageName> {
        let idx = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageName::Batching => write!(f, "batching"),
            StageName::FerryCart => write!(f, "ferry-cart"),
            StageName::Tilting => write!(f, "tilting-crane"),
            StageName::Cutting => write!(f, "cutting"),
            StageName::Autoclave => write!(f, "autoclave"),
            StageName::Segregation => write!(f, "segregation"),
        }
    }
}

impl std::str::FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "batching" => Ok(StageName::Batching),
            "ferry-cart" | "ferrycart" | "ferry-carts" => Ok(StageName::FerryCart),
            "tilting" | "tilting-crane" | "tiltingcrane" => Ok(StageName::Tilting),
            "cutting" => Ok(StageName::Cutting),
            "autoclave" => Ok(StageName::Autoclave),
            "segregation" => Ok(StageName::Segregation),
            _ => Err(format!("Invalid stage: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Pending => write!(f, "pending"),
            StageStatus::InProgress => write!(f, "in-progress"),
            StageStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for StageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "pending" => Ok(StageStatus::Pending),
            "in-progress" | "inprogress" => Ok(StageStatus::InProgress),
            "completed" | "complete" | "done" => Ok(StageStatus::Completed),
            _ => Err(format!("Invalid stage status: {}", s)),
        }
    }
}

/// Per-stage progress of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStages {
    pub batching: StageStatus,
    pub ferry_cart: StageStatus,
    pub tilting: StageStatus,
    pub cutting: StageStatus,
    pub autoclave: StageStatus,
    pub segregation: StageStatus,
}

impl BatchStages {
    pub fn get(&self, stage: StageName) -> StageStatus {
        match stage {
            StageName::Batching => self.batching,
            StageName::FerryCart => self.ferry_cart,
            StageName::Tilting => self.tilting,
            StageName::Cutting => self.cutting,
            StageName::Autoclave => self.autoclave,
            StageName::Segregation => self.segregation,
        }
    }

    pub fn set(&mut self, stage: StageName, status: StageStatus) {
        let slot = match stage {
            StageName::Batching => &mut self.batching,
            StageName::FerryCart => &mut self.ferry_cart,
            StageName::Tilting => &mut self.tilting,
            StageName::Cutting => &mut self.cutting,
            StageName::Autoclave => &mut self.autoclave,
            StageName::Segregation => &mut self.segregation,
        };
        *slot = status;
    }

    /// Mark `stage` and every stage before it completed.
    pub fn complete_through(&mut self, stage: StageName) {
        for s in StageName::ALL {
            self.set(s, StageStatus::Completed);
            if s == stage {
                break;
            }
        }
    }

    pub fn all(status: StageStatus) -> Self {
        Self {
            batching: status,
            ferry_cart: status,
            tilting: status,
            cutting: status,
            autoclave: status,
            segregation: status,
        }
    }
}
