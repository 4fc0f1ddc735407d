use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 報告產生服務的請求內容，欄位順序即章節順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub executive_summary: String,
    pub portfolio_summary: String,
    pub tax_loss_harvesting_analysis: String,
    pub reinvestment_strategy: String,
    pub portfolio_outlook: String,
    pub actionable_next_steps: String,
    pub irs_compliance_warning: String,
}

impl ReportRequest {
    pub const FIELD_NAMES: [&'static str; 7] = [
        "executive_summary",
        "portfolio_summary",
        "tax_loss_harvesting_analysis",
        "reinvestment_strategy",
        "portfolio_outlook",
        "actionable_next_steps",
        "irs_compliance_warning",
    ];

    /// (field name, content) pairs in rendering order.
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            (Self::FIELD_NAMES[0], self.executive_summary.as_str()),
            (Self::FIELD_NAMES[1], self.portfolio_summary.as_str()),
            (Self::FIELD_NAMES[2], self.tax_loss_harvesting_analysis.as_str()),
            (Self::FIELD_NAMES[3], self.reinvestment_strategy.as_str()),
            (Self::FIELD_NAMES[4], self.portfolio_outlook.as_str()),
            (Self::FIELD_NAMES[5], self.actionable_next_steps.as_str()),
            (Self::FIELD_NAMES[6], self.irs_compliance_warning.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub object_key: String,
    pub file_url: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Paragraph(String),
    Table(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Standard,
    Disclaimer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub kind: SectionKind,
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    pub email: String,
    pub risk_tolerance: String,
    pub goals: String,
    #[serde(default)]
    pub sector_preferences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    /// 每股成本
    pub cost_basis: f64,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingTerm {
    ShortTerm,
    LongTerm,
}

impl HoldingTerm {
    pub fn label(&self) -> &'static str {
        match self {
            HoldingTerm::ShortTerm => "Short",
            HoldingTerm::LongTerm => "Long",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub holding: Holding,
    pub price: f64,
    pub market_value: f64,
    pub cost: f64,
    pub unrealized: f64,
    pub holding_days: i64,
    pub term: HoldingTerm,
}

impl PositionSnapshot {
    pub fn new(holding: Holding, price: f64, as_of: NaiveDate) -> Self {
        let market_value = holding.shares * price;
        let cost = holding.shares * holding.cost_basis;
        let holding_days = (as_of - holding.purchase_date).num_days();
        // 持有超過一年才算長期
        let term = if holding_days > 365 {
            HoldingTerm::LongTerm
        } else {
            HoldingTerm::ShortTerm
        };
        Self {
            holding,
            price,
            market_value,
            cost,
            unrealized: market_value - cost,
            holding_days,
            term,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub as_of: NaiveDate,
    pub positions: Vec<PositionSnapshot>,
    pub total_market_value: f64,
    pub total_cost: f64,
    pub total_unrealized: f64,
}

impl PortfolioSnapshot {
    pub fn new(as_of: NaiveDate, positions: Vec<PositionSnapshot>) -> Self {
        let total_market_value = positions.iter().map(|p| p.market_value).sum();
        let total_cost = positions.iter().map(|p| p.cost).sum();
        let total_unrealized = positions.iter().map(|p| p.unrealized).sum();
        Self {
            as_of,
            positions,
            total_market_value,
            total_cost,
            total_unrealized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct AdvisoryOutput {
    pub snapshot: PortfolioSnapshot,
    pub recommendations: String,
    pub report: ReportRequest,
    pub email: EmailDraft,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub bundle_path: String,
    pub report_url: String,
    pub positions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_position_snapshot_loss_and_term() {
        let holding = Holding {
            symbol: "XYZ".to_string(),
            shares: 10.0,
            cost_basis: 50.0,
            purchase_date: date("2024-01-01"),
        };
        let snap = PositionSnapshot::new(holding, 40.0, date("2024-06-01"));
        assert_eq!(snap.market_value, 400.0);
        assert_eq!(snap.cost, 500.0);
        assert_eq!(snap.unrealized, -100.0);
        assert_eq!(snap.term, HoldingTerm::ShortTerm);
    }

    #[test]
    fn test_term_boundary_is_strictly_over_one_year() {
        let holding = Holding {
            symbol: "ABC".to_string(),
            shares: 1.0,
            cost_basis: 1.0,
            purchase_date: date("2023-01-01"),
        };
        // 2023 has 365 days
        let exactly = PositionSnapshot::new(holding.clone(), 1.0, date("2024-01-01"));
        assert_eq!(exactly.term, HoldingTerm::ShortTerm);
        let over = PositionSnapshot::new(holding, 1.0, date("2024-01-02"));
        assert_eq!(over.term, HoldingTerm::LongTerm);
    }

    #[test]
    fn test_request_fields_order() {
        let request = ReportRequest {
            executive_summary: "a".to_string(),
            irs_compliance_warning: "g".to_string(),
            ..Default::default()
        };
        let fields = request.fields();
        assert_eq!(fields[0], ("executive_summary", "a"));
        assert_eq!(fields[6], ("irs_compliance_warning", "g"));
    }
}
