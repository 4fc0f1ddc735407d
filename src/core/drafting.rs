use crate::domain::model::{ClientProfile, EmailDraft, PortfolioSnapshot, PositionSnapshot, ReportRequest};
use crate::utils::error::{ReportError, Result};
use serde_json::Value;

pub const DEFAULT_EMAIL_SUBJECT: &str = "Your Portfolio Optimization Report";
pub const REPORT_URL_PLACEHOLDER: &str = "{report_url}";

const ADVISOR_SYSTEM: &str = "You are a financial advisor's assistant specializing in tax-loss \
harvesting and portfolio rebalancing. Be precise, cite the figures you are given, and always \
respect IRS wash-sale rules (no substantially identical repurchase within 30 days before or after \
a sale).";

fn money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${:.2}", sign, value.abs())
}

/// Markdown table of every position plus a totals row.
pub fn portfolio_summary_table(snapshot: &PortfolioSnapshot) -> String {
    let mut lines = vec![
        "| Symbol | Shares | Cost Basis | Price | Market Value | Unrealized G/L | Term |".to_string(),
        "|---|---|---|---|---|---|---|".to_string(),
    ];
    for p in &snapshot.positions {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} |",
            p.holding.symbol,
            p.holding.shares,
            money(p.holding.cost_basis),
            money(p.price),
            money(p.market_value),
            money(p.unrealized),
            p.term.label()
        ));
    }
    lines.push(format!(
        "| Total | | {} | | {} | {} | |",
        money(snapshot.total_cost),
        money(snapshot.total_market_value),
        money(snapshot.total_unrealized)
    ));
    lines.join("\n")
}

/// 未實現虧損的部位，虧損最大者在前
pub fn loss_positions(snapshot: &PortfolioSnapshot) -> Vec<&PositionSnapshot> {
    let mut losses: Vec<&PositionSnapshot> = snapshot
        .positions
        .iter()
        .filter(|p| p.unrealized < 0.0)
        .collect();
    losses.sort_by(|a, b| a.unrealized.total_cmp(&b.unrealized));
    losses
}

fn client_block(client: &ClientProfile) -> String {
    let sectors = if client.sector_preferences.is_empty() {
        "none stated".to_string()
    } else {
        client.sector_preferences.join(", ")
    };
    format!(
        "Client: {}\nRisk tolerance: {}\nGoals: {}\nSector preferences: {}",
        client.name, client.risk_tolerance, client.goals, sectors
    )
}

fn losses_block(snapshot: &PortfolioSnapshot) -> String {
    let losses = loss_positions(snapshot);
    if losses.is_empty() {
        return "No positions currently show an unrealized loss.".to_string();
    }
    losses
        .iter()
        .map(|p| {
            format!(
                "- {}: {} unrealized ({} term, held {} days)",
                p.holding.symbol,
                money(p.unrealized),
                p.term.label().to_lowercase(),
                p.holding_days
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn recommendation_prompt(client: &ClientProfile, snapshot: &PortfolioSnapshot) -> (String, String) {
    let user = format!(
        "Task: recommendations\n\n{}\n\nPortfolio as of {}:\n{}\n\nPositions with unrealized losses:\n{}\n\n\
Propose tax-loss harvesting trades and rebalancing steps for this client. For each sale, name a \
replacement that keeps market exposure without being substantially identical.",
        client_block(client),
        snapshot.as_of,
        portfolio_summary_table(snapshot),
        losses_block(snapshot)
    );
    (ADVISOR_SYSTEM.to_string(), user)
}

pub fn report_prompt(
    client: &ClientProfile,
    snapshot: &PortfolioSnapshot,
    recommendations: &str,
) -> (String, String) {
    let fields: Vec<&str> = ReportRequest::FIELD_NAMES
        .iter()
        .copied()
        .filter(|f| *f != "portfolio_summary")
        .collect();
    let user = format!(
        "Task: report\n\n{}\n\nPortfolio as of {}:\n{}\n\nRecommendations:\n{}\n\n\
Write the client report. Reply with a single JSON object whose keys are exactly: {}. Each value \
is plain text; Markdown pipe tables are allowed.",
        client_block(client),
        snapshot.as_of,
        portfolio_summary_table(snapshot),
        recommendations,
        fields.join(", ")
    );
    (ADVISOR_SYSTEM.to_string(), user)
}

pub fn email_prompt(client: &ClientProfile, recommendations: &str) -> (String, String) {
    let user = format!(
        "Task: email\n\n{}\n\nRecommendations:\n{}\n\n\
Draft a short, friendly email to the client summarizing these recommendations. Start with a line \
'Subject: ...'. Include the placeholder {} where the report download link belongs.",
        client_block(client),
        recommendations,
        REPORT_URL_PLACEHOLDER
    );
    (ADVISOR_SYSTEM.to_string(), user)
}

/// 模型常把 JSON 包在 ``` 區塊裡
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

pub fn parse_report_sections(raw: &str, portfolio_summary: &str) -> Result<ReportRequest> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))?;
    let object = value.as_object().ok_or_else(|| ReportError::ValidationError {
        message: "Report draft is not a JSON object".to_string(),
    })?;

    let field = |name: &str| -> Result<String> {
        match object.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            Some(Value::Null) | None => Err(ReportError::ValidationError {
                message: format!("Report draft is missing '{}'", name),
            }),
            Some(other) => Err(ReportError::ValidationError {
                message: format!("Report draft field '{}' must be text, got {}", name, other),
            }),
        }
    };

    Ok(ReportRequest {
        executive_summary: field("executive_summary")?,
        portfolio_summary: portfolio_summary.to_string(),
        tax_loss_harvesting_analysis: field("tax_loss_harvesting_analysis")?,
        reinvestment_strategy: field("reinvestment_strategy")?,
        portfolio_outlook: field("portfolio_outlook")?,
        actionable_next_steps: field("actionable_next_steps")?,
        irs_compliance_warning: field("irs_compliance_warning")?,
    })
}

pub fn parse_email(raw: &str, to: &str) -> EmailDraft {
    let text = strip_code_fences(raw);
    let mut subject = None;
    let mut body_lines = Vec::new();
    for line in text.lines() {
        if subject.is_none() {
            if let Some(s) = line.trim().strip_prefix("Subject:") {
                subject = Some(s.trim().to_string());
                continue;
            }
        }
        body_lines.push(line);
    }

    EmailDraft {
        to: to.to_string(),
        subject: subject
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_EMAIL_SUBJECT.to_string()),
        body: body_lines.join("\n").trim().to_string(),
    }
}

/// 把下載連結放進信件；沒有佔位符就附在最後
pub fn attach_report_url(email: &mut EmailDraft, url: &str) {
    if email.body.contains(REPORT_URL_PLACEHOLDER) {
        email.body = email.body.replace(REPORT_URL_PLACEHOLDER, url);
    } else {
        email.body = format!("{}\n\nYour full report: {}", email.body, url);
    }
}

pub fn render_email(email: &EmailDraft) -> String {
    format!("To: {}\nSubject: {}\n\n{}\n", email.to, email.subject, email.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markdown::split_blocks;
    use crate::domain::model::{ContentBlock, Holding};
    use chrono::NaiveDate;

    fn snapshot() -> PortfolioSnapshot {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let holding = |symbol: &str, shares: f64, cost: f64, date: (i32, u32, u32)| Holding {
            symbol: symbol.to_string(),
            shares,
            cost_basis: cost,
            purchase_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        };
        PortfolioSnapshot::new(
            as_of,
            vec![
                PositionSnapshot::new(holding("XYZ", 10.0, 50.0, (2024, 1, 2)), 40.0, as_of),
                PositionSnapshot::new(holding("ABC", 5.0, 100.0, (2020, 3, 1)), 150.0, as_of),
                PositionSnapshot::new(holding("QQQ", 2.0, 300.0, (2023, 1, 1)), 150.0, as_of),
            ],
        )
    }

    #[test]
    fn test_summary_table_is_valid_markdown_table() {
        let table = portfolio_summary_table(&snapshot());
        let blocks = split_blocks(&table).unwrap();
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            ContentBlock::Table(t) => {
                assert_eq!(t.header.len(), 7);
                assert_eq!(t.rows.len(), 4);
                assert_eq!(t.rows[0][5], "-$100.00");
                assert_eq!(t.rows[3][0], "Total");
                assert_eq!(t.rows[3][4], "$1450.00");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_loss_positions_sorted_by_largest_loss() {
        let snap = snapshot();
        let losses: Vec<&str> = loss_positions(&snap)
            .iter()
            .map(|p| p.holding.symbol.as_str())
            .collect();
        assert_eq!(losses, vec!["QQQ", "XYZ"]);
    }

    #[test]
    fn test_prompts_carry_facts() {
        let client = ClientProfile {
            name: "Jordan Lee".to_string(),
            risk_tolerance: "aggressive".to_string(),
            ..Default::default()
        };
        let (_, user) = recommendation_prompt(&client, &snapshot());
        assert!(user.contains("Jordan Lee"));
        assert!(user.contains("- QQQ: -$300.00 unrealized"));

        let (_, user) = report_prompt(&client, &snapshot(), "Sell QQQ");
        assert!(user.contains("irs_compliance_warning"));
        assert!(!user.contains("portfolio_summary,"));

        let (_, user) = email_prompt(&client, "Sell QQQ");
        assert!(user.contains(REPORT_URL_PLACEHOLDER));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_report_sections() {
        let raw = r#"```json
{
  "executive_summary": "Harvest $400 of losses.",
  "tax_loss_harvesting_analysis": "Sell QQQ and XYZ.",
  "reinvestment_strategy": "Buy VTI.",
  "portfolio_outlook": "Balanced.",
  "actionable_next_steps": ["1. Sell QQQ", "2. Buy VTI"],
  "irs_compliance_warning": "Wait 31 days before repurchasing."
}
```"#;
        let report = parse_report_sections(raw, "| a |\n|---|\n| 1 |").unwrap();
        assert_eq!(report.executive_summary, "Harvest $400 of losses.");
        assert_eq!(report.portfolio_summary, "| a |\n|---|\n| 1 |");
        assert_eq!(report.actionable_next_steps, "1. Sell QQQ\n2. Buy VTI");
    }

    #[test]
    fn test_parse_report_sections_missing_field() {
        let err = parse_report_sections(r#"{"executive_summary": "x"}"#, "").unwrap_err();
        assert!(err.to_string().contains("tax_loss_harvesting_analysis"));
    }

    #[test]
    fn test_parse_report_sections_rejects_null_and_numbers() {
        let draft = |summary: serde_json::Value| {
            serde_json::json!({
                "executive_summary": summary,
                "tax_loss_harvesting_analysis": "a",
                "reinvestment_strategy": "b",
                "portfolio_outlook": "c",
                "actionable_next_steps": "d",
                "irs_compliance_warning": "e"
            })
            .to_string()
        };

        let err = parse_report_sections(&draft(serde_json::Value::Null), "").unwrap_err();
        assert!(matches!(err, ReportError::ValidationError { .. }));
        assert!(err.to_string().contains("missing 'executive_summary'"));

        let err = parse_report_sections(&draft(serde_json::json!(42)), "").unwrap_err();
        assert!(err.to_string().contains("must be text"));

        let report = parse_report_sections(&draft(serde_json::json!("ok")), "").unwrap();
        assert_eq!(report.executive_summary, "ok");
    }

    #[test]
    fn test_parse_email_and_attach_url() {
        let mut email = parse_email(
            "Subject: Your Q2 tax savings\n\nHi Jordan,\nDetails: {report_url}\nBest",
            "jordan@example.com",
        );
        assert_eq!(email.subject, "Your Q2 tax savings");
        assert!(email.body.starts_with("Hi Jordan,"));

        attach_report_url(&mut email, "https://files/r.pdf");
        assert!(email.body.contains("Details: https://files/r.pdf"));

        let mut plain = parse_email("Hi Jordan", "jordan@example.com");
        assert_eq!(plain.subject, DEFAULT_EMAIL_SUBJECT);
        attach_report_url(&mut plain, "https://files/r.pdf");
        assert!(plain.body.ends_with("Your full report: https://files/r.pdf"));
        assert!(render_email(&plain).starts_with("To: jordan@example.com\nSubject: "));
    }
}
