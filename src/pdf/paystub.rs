//! Paystub rendering. Two layouts exist: the earnings-statement layout for
//! the payroll generation endpoint, and the simpler layout re-rendered from a
//! stored paystub row when no blob copy exists.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BrandingConfig;
use crate::entities::paystubs;

use super::format::{
    format_currency, format_optional_decimal, format_plain_decimal, sanitize_surname,
};
use super::layout::{FOOTER_HEIGHT, LINE_HEIGHT, MARGIN, PAGE_HEIGHT, content_right, min_body_y};
use super::metrics::Font;
use super::page::{DocumentBuilder, RenderedPdf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaystubStatement {
    pub company: CompanyInfo,
    pub employee: EmployeeInfo,
    pub pay_period: PayPeriodInfo,
    pub earnings: Vec<EarningsItem>,
    pub deductions: Vec<DeductionItem>,
    pub totals: Totals,
    pub payment: PaymentInfo,
    pub metadata: StatementMetadata,
    #[serde(default)]
    pub leave_balances: Option<LeaveBalances>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyInfo {
    pub company_name: String,
    #[serde(default)]
    pub company_logo_url: Option<String>,
    pub company_address: String,
    pub payroll_contact_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmployeeInfo {
    pub employee_id: String,
    pub employee_name: String,
    pub job_title: String,
    pub department: String,
    pub employment_type: EmploymentType,
    pub pay_type: PayType,
    pub pay_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-Time")]
    FullTime,
    #[serde(rename = "Part-Time")]
    PartTime,
    Contractor,
}

impl EmploymentType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::FullTime => "Full-Time",
            Self::PartTime => "Part-Time",
            Self::Contractor => "Contractor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayType {
    Hourly,
    Salary,
}

impl PayType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "Hourly",
            Self::Salary => "Salary",
        }
    }

    const fn rate_unit(self) -> &'static str {
        match self {
            Self::Hourly => "/hr",
            Self::Salary => "/yr",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayPeriodInfo {
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub pay_date: NaiveDate,
    pub pay_frequency: PayFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayFrequency {
    Weekly,
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    #[serde(rename = "Semi-Monthly")]
    SemiMonthly,
    Monthly,
}

impl PayFrequency {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::BiWeekly => "Bi-Weekly",
            Self::SemiMonthly => "Semi-Monthly",
            Self::Monthly => "Monthly",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EarningsItem {
    pub description: String,
    #[serde(default)]
    pub hours: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    pub current_amount: Decimal,
    pub ytd_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeductionItem {
    pub deduction_name: String,
    pub current_amount: Decimal,
    pub ytd_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Totals {
    pub gross_pay_current: Decimal,
    pub total_deductions_current: Decimal,
    pub net_pay_current: Decimal,
    pub gross_pay_ytd: Decimal,
    pub total_deductions_ytd: Decimal,
    pub net_pay_ytd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentInfo {
    pub payment_method: PaymentMethod,
    pub bank_name_masked: String,
    pub payment_status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Direct Deposit")]
    DirectDeposit,
    Check,
}

impl PaymentMethod {
    const fn as_str(self) -> &'static str {
        match self {
            Self::DirectDeposit => "Direct Deposit",
            Self::Check => "Check",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatementMetadata {
    pub paystub_id: String,
    pub generated_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveBalances {
    pub vacation_accrued: Decimal,
    pub vacation_used: Decimal,
    pub vacation_balance: Decimal,
    pub sick_accrued: Decimal,
    pub sick_used: Decimal,
    pub sick_balance: Decimal,
}

/// `{PREFIX}_PAYSTUB_{SURNAME}_{YYYYMMDD}.pdf`, surname taken from the last
/// whitespace token of the employee name.
#[must_use]
pub fn build_paystub_filename(
    prefix: &str,
    employee_name: &str,
    pay_date: NaiveDate,
) -> String {
    let last = employee_name
        .split_whitespace()
        .next_back()
        .unwrap_or("EMPLOYEE");
    format!(
        "{prefix}_PAYSTUB_{}_{}.pdf",
        sanitize_surname(last),
        pay_date.format("%Y%m%d")
    )
}

fn rate_with_unit(rate: Decimal, pay_type: PayType) -> String {
    format!("{}{}", format_currency(rate), pay_type.rate_unit())
}

fn footer_lines(branding: &BrandingConfig, generated_at: DateTime<Utc>) -> Result<(String, String)> {
    let tz: chrono_tz::Tz = branding
        .time_zone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid time zone {:?}: {e}", branding.time_zone))?;
    let local = generated_at.with_timezone(&tz);
    let host = branding
        .base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");

    let line1 = format!(
        "{} | Generated via {} ({host}) | Generated on: {} {}",
        branding.employer_legal_name,
        branding.project_name,
        local.format("%Y-%m-%d %H:%M:%S"),
        branding.time_zone_label,
    );
    let line2 = format!(
        "This document was generated electronically via {}.",
        branding.project_name
    );
    Ok((line1, line2))
}

fn draw_footer(builder: &mut DocumentBuilder, line1: &str, line2: &str) {
    builder.set_fill_gray(0.2);
    builder.draw_string(MARGIN, 36.0, Font::Helvetica, 9.0, line1);
    builder.draw_string(MARGIN, 24.0, Font::Helvetica, 9.0, line2);
    builder.set_fill_gray(0.0);
}

/// Renders the earnings-statement layout for the generation endpoint.
pub fn render_statement(
    payload: &PaystubStatement,
    branding: &BrandingConfig,
) -> Result<RenderedPdf> {
    let mut builder = DocumentBuilder::new(&format!("{} Paystub", branding.project_name));
    builder
        .author(&branding.employer_legal_name)
        .subject(&format!("Paystub ID: {}", payload.metadata.paystub_id))
        .keywords(&format!(
            "employee_id:{}, pay_date:{}",
            payload.employee.employee_id, payload.pay_period.pay_date
        ));

    let (footer1, footer2) = footer_lines(branding, payload.metadata.generated_timestamp)?;
    let right = content_right();

    let draw_header = |b: &mut DocumentBuilder| -> f32 {
        let mut y = PAGE_HEIGHT - MARGIN;
        b.draw_string(MARGIN, y, Font::HelveticaBold, 16.0, &branding.employer_legal_name);
        y -= 16.0;
        b.draw_string(MARGIN, y, Font::Helvetica, 9.0, &payload.company.company_address);
        y -= 12.0;
        b.draw_string(
            MARGIN,
            y,
            Font::Helvetica,
            9.0,
            &format!("Payroll contact: {}", payload.company.payroll_contact_email),
        );

        b.draw_right_string(
            right,
            PAGE_HEIGHT - MARGIN,
            Font::HelveticaBold,
            10.0,
            "EARNINGS STATEMENT",
        );
        b.draw_right_string(
            right,
            PAGE_HEIGHT - MARGIN - 14.0,
            Font::Helvetica,
            9.0,
            &format!("Pay date: {}", payload.pay_period.pay_date),
        );
        b.draw_right_string(
            right,
            PAGE_HEIGHT - MARGIN - 26.0,
            Font::Helvetica,
            9.0,
            &format!(
                "Pay period: {} to {}",
                payload.pay_period.pay_period_start, payload.pay_period.pay_period_end
            ),
        );
        let y = PAGE_HEIGHT - MARGIN - 44.0;
        b.line(MARGIN, y, right, y);
        y - 18.0
    };

    // Breaks the page when `required_lines` more rows would reach the footer.
    let ensure_space = |b: &mut DocumentBuilder, y: f32, required_lines: u32| -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let lookahead = required_lines as f32 * LINE_HEIGHT;
        if y - lookahead < min_body_y() {
            draw_footer(b, &footer1, &footer2);
            b.show_page();
            draw_header(b)
        } else {
            y
        }
    };

    let mut y = draw_header(&mut builder);

    builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Employee");
    y -= 14.0;
    builder.draw_string(MARGIN, y, Font::Helvetica, 10.0, &payload.employee.employee_name);
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!(
            "{} - {}",
            payload.employee.job_title, payload.employee.department
        ),
    );
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!(
            "{} - {}",
            payload.employee.employment_type.as_str(),
            payload.employee.pay_type.as_str()
        ),
    );
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!(
            "Pay rate: {}",
            rate_with_unit(payload.employee.pay_rate, payload.employee.pay_type)
        ),
    );
    y -= 18.0;

    builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Payment");
    y -= 14.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!("Pay frequency: {}", payload.pay_period.pay_frequency.as_str()),
    );
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!("Payment method: {}", payload.payment.payment_method.as_str()),
    );
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!("Payment status: {}", payload.payment.payment_status),
    );
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!("Bank: {}", payload.payment.bank_name_masked),
    );
    y -= 18.0;

    y = ensure_space(&mut builder, y, 4);
    builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Earnings");
    y -= 12.0;
    builder.draw_string(MARGIN, y, Font::HelveticaBold, 9.0, "Description");
    builder.draw_right_string(MARGIN + 250.0, y, Font::HelveticaBold, 9.0, "Hours");
    builder.draw_right_string(MARGIN + 320.0, y, Font::HelveticaBold, 9.0, "Rate");
    builder.draw_right_string(MARGIN + 400.0, y, Font::HelveticaBold, 9.0, "Current");
    builder.draw_right_string(right, y, Font::HelveticaBold, 9.0, "YTD");
    y -= 6.0;
    builder.line(MARGIN, y, right, y);
    y -= 12.0;

    for item in &payload.earnings {
        y = ensure_space(&mut builder, y, 2);
        builder.draw_string(MARGIN, y, Font::Helvetica, 9.0, &item.description);
        builder.draw_right_string(
            MARGIN + 250.0,
            y,
            Font::Helvetica,
            9.0,
            &format_optional_decimal(item.hours),
        );
        builder.draw_right_string(
            MARGIN + 320.0,
            y,
            Font::Helvetica,
            9.0,
            &format_optional_decimal(item.rate),
        );
        builder.draw_right_string(
            MARGIN + 400.0,
            y,
            Font::Helvetica,
            9.0,
            &format_currency(item.current_amount),
        );
        builder.draw_right_string(right, y, Font::Helvetica, 9.0, &format_currency(item.ytd_amount));
        y -= 12.0;
    }

    builder.draw_string(MARGIN, y, Font::HelveticaBold, 9.0, "Gross Pay");
    builder.draw_right_string(
        MARGIN + 400.0,
        y,
        Font::HelveticaBold,
        9.0,
        &format_currency(payload.totals.gross_pay_current),
    );
    builder.draw_right_string(
        right,
        y,
        Font::HelveticaBold,
        9.0,
        &format_currency(payload.totals.gross_pay_ytd),
    );
    y -= 18.0;

    y = ensure_space(&mut builder, y, 4);
    builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Deductions");
    y -= 12.0;
    builder.draw_string(MARGIN, y, Font::HelveticaBold, 9.0, "Deduction");
    builder.draw_right_string(MARGIN + 400.0, y, Font::HelveticaBold, 9.0, "Current");
    builder.draw_right_string(right, y, Font::HelveticaBold, 9.0, "YTD");
    y -= 6.0;
    builder.line(MARGIN, y, right, y);
    y -= 12.0;

    for item in &payload.deductions {
        y = ensure_space(&mut builder, y, 2);
        builder.draw_string(MARGIN, y, Font::Helvetica, 9.0, &item.deduction_name);
        builder.draw_right_string(
            MARGIN + 400.0,
            y,
            Font::Helvetica,
            9.0,
            &format_currency(item.current_amount),
        );
        builder.draw_right_string(right, y, Font::Helvetica, 9.0, &format_currency(item.ytd_amount));
        y -= 12.0;
    }

    builder.draw_string(MARGIN, y, Font::HelveticaBold, 9.0, "Total Deductions");
    builder.draw_right_string(
        MARGIN + 400.0,
        y,
        Font::HelveticaBold,
        9.0,
        &format_currency(payload.totals.total_deductions_current),
    );
    builder.draw_right_string(
        right,
        y,
        Font::HelveticaBold,
        9.0,
        &format_currency(payload.totals.total_deductions_ytd),
    );
    y -= 24.0;

    y = ensure_space(&mut builder, y, 4);
    let box_height = 32.0;
    let box_bottom = y - box_height;
    let text_y = box_bottom + 18.0;
    builder.rect(MARGIN, box_bottom, right - MARGIN, box_height);
    builder.draw_string(MARGIN + 8.0, text_y, Font::HelveticaBold, 12.0, "Net Pay");
    builder.draw_right_string(
        right - 8.0,
        text_y,
        Font::HelveticaBold,
        12.0,
        &format_currency(payload.totals.net_pay_current),
    );
    y = box_bottom - 16.0;

    builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Year-to-Date Summary");
    y -= 12.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        9.0,
        &format!("Gross: {}", format_currency(payload.totals.gross_pay_ytd)),
    );
    builder.draw_string(
        MARGIN + 180.0,
        y,
        Font::Helvetica,
        9.0,
        &format!(
            "Deductions: {}",
            format_currency(payload.totals.total_deductions_ytd)
        ),
    );
    builder.draw_string(
        MARGIN + 360.0,
        y,
        Font::Helvetica,
        9.0,
        &format!("Net: {}", format_currency(payload.totals.net_pay_ytd)),
    );
    y -= 18.0;

    if let Some(leave) = &payload.leave_balances {
        y = ensure_space(&mut builder, y, 6);
        builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Leave Balances (Hours)");
        y -= 12.0;
        builder.draw_string(MARGIN, y, Font::HelveticaBold, 9.0, "Type");
        builder.draw_right_string(MARGIN + 260.0, y, Font::HelveticaBold, 9.0, "Accrued");
        builder.draw_right_string(MARGIN + 360.0, y, Font::HelveticaBold, 9.0, "Used");
        builder.draw_right_string(right, y, Font::HelveticaBold, 9.0, "Balance");
        y -= 6.0;
        builder.line(MARGIN, y, right, y);
        y -= 12.0;

        builder.draw_string(MARGIN, y, Font::Helvetica, 9.0, "Vacation");
        builder.draw_right_string(
            MARGIN + 260.0,
            y,
            Font::Helvetica,
            9.0,
            &format_plain_decimal(leave.vacation_accrued),
        );
        builder.draw_right_string(
            MARGIN + 360.0,
            y,
            Font::Helvetica,
            9.0,
            &format_plain_decimal(leave.vacation_used),
        );
        builder.draw_right_string(
            right,
            y,
            Font::Helvetica,
            9.0,
            &format_plain_decimal(leave.vacation_balance),
        );
        y -= 12.0;
        builder.draw_string(MARGIN, y, Font::Helvetica, 9.0, "Sick");
        builder.draw_right_string(
            MARGIN + 260.0,
            y,
            Font::Helvetica,
            9.0,
            &format_plain_decimal(leave.sick_accrued),
        );
        builder.draw_right_string(
            MARGIN + 360.0,
            y,
            Font::Helvetica,
            9.0,
            &format_plain_decimal(leave.sick_used),
        );
        builder.draw_right_string(
            right,
            y,
            Font::Helvetica,
            9.0,
            &format_plain_decimal(leave.sick_balance),
        );
    }

    draw_footer(&mut builder, &footer1, &footer2);
    Ok(builder.finish())
}

fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn json_amount(item: &serde_json::Value, key: &str) -> Decimal {
    item.get(key).and_then(json_decimal).unwrap_or_default()
}

fn sum_amounts(items: &[serde_json::Value], key: &str) -> Decimal {
    items.iter().map(|item| json_amount(item, key)).sum()
}

/// Re-renders a stored paystub row. Continuation pages repeat the header with
/// a "(continued)" suffix and the section column headings.
pub fn render_stored(
    paystub: &paystubs::Model,
    branding: &BrandingConfig,
    generated_at: DateTime<Utc>,
) -> Result<RenderedPdf> {
    let mut builder = DocumentBuilder::new(&format!("{} Paystub", branding.project_name));
    builder
        .author(&branding.employer_legal_name)
        .subject(&format!("Paystub ID: {}", paystub.id))
        .keywords(&format!(
            "user_id:{}, pay_date:{}",
            paystub.user_id, paystub.pay_date
        ));

    let (footer1, footer2) = footer_lines(branding, generated_at)?;
    let right = content_right();

    let empty = Vec::new();
    let earnings = paystub.earnings.as_array().unwrap_or(&empty);
    let deductions = paystub.deductions.as_array().unwrap_or(&empty);

    let mut gross_pay = paystub.gross_pay;
    if gross_pay.is_zero() {
        gross_pay = sum_amounts(earnings, "amount");
    }
    let mut total_deductions = paystub.total_deductions;
    if total_deductions.is_zero() {
        total_deductions = sum_amounts(deductions, "amount");
    }
    let mut net_pay = paystub.net_pay;
    if net_pay.is_zero() {
        net_pay = gross_pay - total_deductions;
    }

    let draw_header = |b: &mut DocumentBuilder, continued: bool| -> f32 {
        let suffix = if continued { " (continued)" } else { "" };
        let mut y = PAGE_HEIGHT - MARGIN;
        b.draw_string(
            MARGIN,
            y,
            Font::HelveticaBold,
            16.0,
            &format!("{} Paystub{suffix}", branding.project_name),
        );
        y -= 24.0;
        b.draw_string(
            MARGIN,
            y,
            Font::Helvetica,
            11.0,
            &format!("Employer: {}", branding.employer_legal_name),
        );
        y -= 18.0;
        b.draw_string(
            MARGIN,
            y,
            Font::Helvetica,
            11.0,
            &format!(
                "Employee: {} {}",
                paystub.employee_first_name, paystub.employee_last_name
            ),
        );
        y -= 18.0;
        b.draw_string(
            MARGIN,
            y,
            Font::Helvetica,
            11.0,
            &format!(
                "Pay period: {} to {}",
                paystub.pay_period_start, paystub.pay_period_end
            ),
        );
        y -= 18.0;
        b.draw_string(
            MARGIN,
            y,
            Font::Helvetica,
            11.0,
            &format!("Pay date: {}", paystub.pay_date),
        );
        y - 24.0
    };

    let draw_earnings_header = |b: &mut DocumentBuilder, y: f32| -> f32 {
        let mut y = y;
        b.draw_string(MARGIN, y, Font::HelveticaBold, 11.0, "Earnings Statement");
        y -= 16.0;
        b.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Description");
        b.draw_string(MARGIN + 250.0, y, Font::HelveticaBold, 10.0, "Hours");
        b.draw_string(MARGIN + 320.0, y, Font::HelveticaBold, 10.0, "Rate");
        b.draw_string(MARGIN + 400.0, y, Font::HelveticaBold, 10.0, "Amount");
        y -= 8.0;
        b.line(MARGIN, y, right, y);
        y - 14.0
    };

    let draw_deductions_header = |b: &mut DocumentBuilder, y: f32| -> f32 {
        b.draw_string(MARGIN, y, Font::HelveticaBold, 11.0, "Deductions");
        y - 14.0
    };

    enum Section {
        None,
        Earnings,
        Deductions,
    }

    // Breaks the page when fewer than `lines` rows fit above the footer band,
    // repeating the continuation header and the active section heading.
    let ensure_space =
        |b: &mut DocumentBuilder, y: f32, lines: u32, section: &Section| -> (f32, bool) {
            #[allow(clippy::cast_precision_loss)]
            let threshold = FOOTER_HEIGHT + 8.0 + lines as f32 * LINE_HEIGHT;
            if y < threshold {
                draw_footer(b, &footer1, &footer2);
                b.show_page();
                let mut y = draw_header(b, true);
                y = match section {
                    Section::None => y,
                    Section::Earnings => draw_earnings_header(b, y),
                    Section::Deductions => draw_deductions_header(b, y),
                };
                (y, true)
            } else {
                (y, false)
            }
        };

    let mut y = draw_header(&mut builder, false);
    y = draw_earnings_header(&mut builder, y);

    for item in earnings {
        (y, _) = ensure_space(&mut builder, y, 1, &Section::Earnings);
        let description = item
            .get("label")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Earnings");
        builder.draw_string(MARGIN, y, Font::Helvetica, 10.0, description);
        builder.draw_right_string(
            MARGIN + 300.0,
            y,
            Font::Helvetica,
            10.0,
            &item
                .get("hours")
                .and_then(json_decimal)
                .map_or_else(|| "-".to_string(), format_plain_decimal),
        );
        builder.draw_right_string(
            MARGIN + 370.0,
            y,
            Font::Helvetica,
            10.0,
            &item
                .get("rate")
                .and_then(json_decimal)
                .map_or_else(|| "-".to_string(), format_currency),
        );
        builder.draw_right_string(
            right,
            y,
            Font::Helvetica,
            10.0,
            &format_currency(json_amount(item, "amount")),
        );
        y -= 16.0;
    }

    (y, _) = ensure_space(&mut builder, y, 3, &Section::Earnings);
    builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Gross Pay");
    builder.draw_right_string(right, y, Font::HelveticaBold, 10.0, &format_currency(gross_pay));
    y -= 16.0;

    if deductions.is_empty() {
        y -= 8.0;
    } else {
        let (after, did_break) = ensure_space(&mut builder, y, 2, &Section::Deductions);
        y = if did_break {
            after
        } else {
            draw_deductions_header(&mut builder, after)
        };
        for item in deductions {
            (y, _) = ensure_space(&mut builder, y, 1, &Section::Deductions);
            let label = item
                .get("label")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Deduction");
            builder.draw_string(MARGIN, y, Font::Helvetica, 10.0, label);
            builder.draw_right_string(
                right,
                y,
                Font::Helvetica,
                10.0,
                &format_currency(json_amount(item, "amount")),
            );
            y -= 14.0;
        }
        builder.draw_string(MARGIN, y, Font::HelveticaBold, 10.0, "Total Deductions");
        builder.draw_right_string(
            right,
            y,
            Font::HelveticaBold,
            10.0,
            &format_currency(total_deductions),
        );
        y -= 18.0;
    }

    (y, _) = ensure_space(&mut builder, y, 2, &Section::None);
    builder.draw_string(MARGIN, y, Font::HelveticaBold, 12.0, "Net Pay");
    builder.draw_right_string(right, y, Font::HelveticaBold, 12.0, &format_currency(net_pay));

    draw_footer(&mut builder, &footer1, &footer2);
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn branding() -> BrandingConfig {
        BrandingConfig::default()
    }

    fn stored_paystub(earnings_rows: usize) -> paystubs::Model {
        let earnings: Vec<serde_json::Value> = (0..earnings_rows)
            .map(|i| {
                serde_json::json!({
                    "label": format!("Regular {i}"),
                    "hours": 8.0,
                    "rate": 25.0,
                    "amount": 200.0,
                })
            })
            .collect();
        paystubs::Model {
            id: 1,
            user_id: 3,
            employee_first_name: "Ada".to_string(),
            employee_last_name: "Lovelace".to_string(),
            pay_period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            pay_period_end: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            pay_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            earnings: serde_json::Value::Array(earnings),
            deductions: serde_json::json!([{ "label": "Tax", "amount": 50.0 }]),
            gross_pay: dec!(0),
            total_deductions: dec!(0),
            net_pay: dec!(0),
            file_name: None,
            s3_key: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filename_uses_last_name_token() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            build_paystub_filename("EMPLOYER", "Ada King Lovelace", date),
            "EMPLOYER_PAYSTUB_LOVELACE_20240315.pdf"
        );
        assert_eq!(
            build_paystub_filename("EMPLOYER", "", date),
            "EMPLOYER_PAYSTUB_EMPLOYEE_20240315.pdf"
        );
    }

    #[test]
    fn short_statement_fits_one_page() {
        let rendered = render_stored(&stored_paystub(3), &branding(), Utc::now()).unwrap();
        assert_eq!(rendered.page_count, 1);
    }

    /// Baseline y of every text draw, parsed from the uncompressed content
    /// streams (each string is positioned with an `x y Td` operator).
    fn text_baselines(bytes: &[u8]) -> Vec<f32> {
        String::from_utf8_lossy(bytes)
            .lines()
            .filter_map(|line| {
                let coords = line.strip_suffix(" Td")?;
                coords.split_whitespace().nth(1)?.parse().ok()
            })
            .collect()
    }

    fn is_footer_baseline(y: f32) -> bool {
        (y - 36.0).abs() < 0.01 || (y - 24.0).abs() < 0.01
    }

    #[test]
    fn long_statement_paginates_with_continuation_marker() {
        let rendered = render_stored(&stored_paystub(80), &branding(), Utc::now()).unwrap();
        assert!(rendered.page_count >= 2);
        assert!(
            rendered
                .bytes
                .windows(b"continued".len())
                .any(|w| w == b"continued")
        );
    }

    #[test]
    fn body_rows_never_enter_the_footer_band() {
        let rendered = render_stored(&stored_paystub(80), &branding(), Utc::now()).unwrap();
        let baselines = text_baselines(&rendered.bytes);
        assert!(baselines.len() > 80, "expected one baseline per drawn row");

        // two footer lines on every page, nothing else below the band
        let footer_lines = baselines.iter().filter(|y| is_footer_baseline(**y)).count();
        assert_eq!(footer_lines, 2 * rendered.page_count);
        for y in &baselines {
            assert!(
                *y >= FOOTER_HEIGHT || is_footer_baseline(*y),
                "row baseline {y} drawn inside the footer band"
            );
        }
    }

    #[test]
    fn zero_totals_fall_back_to_item_sums() {
        let rendered = render_stored(&stored_paystub(2), &branding(), Utc::now()).unwrap();
        // gross 400 - deductions 50
        assert!(
            rendered
                .bytes
                .windows(b"$350.00".len())
                .any(|w| w == b"$350.00")
        );
    }
}
