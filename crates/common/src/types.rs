//! Closed vocabularies shared by the store and the dashboard.
//!
//! Parsing is deliberately lenient: filter values arrive from query strings
//! and the collectors, so unrecognized input falls back to the documented
//! default instead of erroring.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Polymarket,
    Kalshi,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polymarket => "polymarket",
            Self::Kalshi => "kalshi",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "polymarket" => Some(Self::Polymarket),
            "kalshi" => Some(Self::Kalshi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Active,
    Resolved,
    Closed,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Sort order for the market list. Unrecognized keys fall back to the
/// default rather than erroring, so stale links keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    VolumeDesc,
    VolumeAsc,
    YesPriceDesc,
    YesPriceAsc,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VolumeDesc => "volume_desc",
            Self::VolumeAsc => "volume_asc",
            Self::YesPriceDesc => "yes_price_desc",
            Self::YesPriceAsc => "yes_price_asc",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
        }
    }

    pub fn from_key(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "volume_asc" => Self::VolumeAsc,
            "yes_price_desc" => Self::YesPriceDesc,
            "yes_price_asc" => Self::YesPriceAsc,
            "title_asc" => Self::TitleAsc,
            "title_desc" => Self::TitleDesc,
            _ => Self::VolumeDesc,
        }
    }

    /// ORDER BY fragment. The id tiebreak keeps pagination stable when the
    /// sorted column has duplicates or nulls.
    pub fn order_clause(&self) -> &'static str {
        match self {
            Self::VolumeDesc => "volume DESC, id",
            Self::VolumeAsc => "volume ASC, id",
            Self::YesPriceDesc => "yes_price DESC, id",
            Self::YesPriceAsc => "yes_price ASC, id",
            Self::TitleAsc => "title ASC, id",
            Self::TitleDesc => "title DESC, id",
        }
    }
}

/// Lookback window for price history. `All` (and anything unrecognized)
/// applies no lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    H24,
    D7,
    D30,
    #[default]
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H24 => "24h",
            Self::D7 => "7d",
            Self::D30 => "30d",
            Self::All => "all",
        }
    }

    pub fn from_key(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "24h" => Self::H24,
            "7d" => Self::D7,
            "30d" => Self::D30,
            _ => Self::All,
        }
    }

    /// SQLite datetime modifier for the lower bound, e.g. `-24 hours`.
    pub fn sqlite_modifier(&self) -> Option<&'static str> {
        match self {
            Self::H24 => Some("-24 hours"),
            Self::D7 => Some("-168 hours"),
            Self::D30 => Some("-720 hours"),
            Self::All => None,
        }
    }
}

/// Curated "interesting markets" heuristics. Unknown keys mean an empty
/// result, not a fallback; the UI only ever links known keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartFilterKey {
    WhaleFavorites,
    ClosingSoon,
    Near5050,
    HighArb,
    Hottest24h,
}

impl SmartFilterKey {
    pub const ALL: [Self; 5] = [
        Self::WhaleFavorites,
        Self::ClosingSoon,
        Self::Near5050,
        Self::HighArb,
        Self::Hottest24h,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhaleFavorites => "whale_favorites",
            Self::ClosingSoon => "closing_soon",
            Self::Near5050 => "near_5050",
            Self::HighArb => "high_arb",
            Self::Hottest24h => "hottest_24h",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WhaleFavorites => "Whale favorites",
            Self::ClosingSoon => "Closing soon",
            Self::Near5050 => "Near 50/50",
            Self::HighArb => "High arb",
            Self::Hottest24h => "Hottest 24h",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "whale_favorites" => Some(Self::WhaleFavorites),
            "closing_soon" => Some(Self::ClosingSoon),
            "near_5050" => Some(Self::Near5050),
            "high_arb" => Some(Self::HighArb),
            "hottest_24h" => Some(Self::Hottest24h),
            _ => None,
        }
    }
}

/// Leaderboard ranking column. Closed set so the column name can be
/// spliced into SQL directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    TotalPnl,
    TotalVolume,
}

impl LeaderboardSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalPnl => "total_pnl",
            Self::TotalVolume => "total_volume",
        }
    }

    pub fn from_key(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "total_volume" => Self::TotalVolume,
            _ => Self::TotalPnl,
        }
    }

    pub fn column(&self) -> &'static str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Success,
    Error,
    Running,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Running => "running",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "running" => Some(Self::Running),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Briefing,
    AlertAnalysis,
    DeepDive,
}

impl ReportType {
    pub const ALL: [Self; 3] = [Self::Briefing, Self::AlertAnalysis, Self::DeepDive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Briefing => "briefing",
            Self::AlertAnalysis => "alert_analysis",
            Self::DeepDive => "deep_dive",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "briefing" => Some(Self::Briefing),
            "alert_analysis" => Some(Self::AlertAnalysis),
            "deep_dive" => Some(Self::DeepDive),
            _ => None,
        }
    }
}

/// The closed category list the matching agent normalizes markets into.
pub const CATEGORIES: [&str; 8] = [
    "Politics",
    "Sports",
    "Crypto",
    "Culture",
    "Weather",
    "Economics",
    "Tech",
    "Finance",
];

/// Alert types the agents currently emit. The column is open-ended; this
/// list only drives the filter dropdown.
pub const ALERT_TYPES: [&str; 6] = [
    "price_move",
    "arbitrage",
    "volume_spike",
    "closing_soon",
    "keyword",
    "whale_trade",
];

/// Map arbitrary input to a canonical category, or None (= no filter) when
/// it is not in the closed list.
pub fn normalize_category(s: &str) -> Option<&'static str> {
    let trimmed = s.trim();
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .copied()
}
