use crate::core::markdown::split_blocks;
use crate::domain::model::{ContentBlock, ReportDocument, ReportRequest, ReportSection, SectionKind};
use crate::utils::error::{ReportError, Result};

pub const DEFAULT_REPORT_TITLE: &str = "Harvest & Invest: Portfolio Optimization Report";

pub const ABOUT_TITLE: &str = "About This Report";

pub const ABOUT_TEXT: &str = "This report outlines a strategy for optimizing your portfolio through \
tax-loss harvesting (TLH) and reinvestment. It is designed to align with your aggressive risk \
tolerance, sector preferences, and growth-oriented investment goals.";

pub const DISCLAIMER_TITLE: &str = "Disclaimer";

pub const DISCLAIMER_TEXT: &str = "This report is provided for informational purposes only and is based on \
the data and preferences you have shared. The recommendations contained herein are intended to assist \
in optimizing your portfolio in alignment with your stated investment goals, risk tolerance, and \
financial objectives.\n\n\
Market Risks: All investments involve risk, including the potential loss of principal. Past \
performance is not indicative of future results.\n\
Tax Considerations: Tax-loss harvesting recommendations are based on current IRS guidelines, which \
are subject to change. Consult a qualified tax advisor.\n\
No Guarantees: There is no guarantee that recommendations will achieve the desired outcomes.\n\
Dynamic Market Conditions: This report does not account for unforeseen market fluctuations or \
macroeconomic factors.\n\n\
Consult with legal, tax, and financial advisors before acting on any recommendations provided in \
this report.";

impl ReportDocument {
    /// 固定的「關於本報告」→ 七個使用者章節 → 免責聲明
    pub fn compose(title: &str, request: &ReportRequest) -> Result<Self> {
        let mut sections = Vec::with_capacity(ReportRequest::FIELD_NAMES.len() + 2);

        sections.push(ReportSection {
            title: ABOUT_TITLE.to_string(),
            kind: SectionKind::Standard,
            blocks: vec![ContentBlock::Paragraph(ABOUT_TEXT.to_string())],
        });

        for (field, content) in request.fields() {
            let section_title = title_case(&field.replace('_', " "));
            tracing::debug!("Composing section: {}", section_title);
            let blocks = split_blocks(content).map_err(|e| ReportError::TableError {
                section: section_title.clone(),
                message: match e {
                    ReportError::ValidationError { message } => message,
                    other => other.to_string(),
                },
            })?;
            sections.push(ReportSection {
                title: section_title,
                kind: SectionKind::Standard,
                blocks,
            });
        }

        sections.push(ReportSection {
            title: DISCLAIMER_TITLE.to_string(),
            kind: SectionKind::Disclaimer,
            blocks: split_blocks(DISCLAIMER_TEXT)?,
        });

        Ok(Self {
            title: title.to_string(),
            sections,
        })
    }
}

/// 與 Python `str.title()` 相同：每段字母的首字大寫，其餘小寫
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_is_alpha = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_is_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(ch);
            prev_is_alpha = false;
        }
    }
    out
}
