//! Employment-verification letter rendering.

use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::config::{BrandingConfig, VerificationConfig};
use crate::domain::EmploymentStatus;

use super::format::format_currency;
use super::layout::{LINE_HEIGHT, MARGIN, PAGE_HEIGHT, PAGE_WIDTH, content_right, wrap_words};
use super::metrics::Font;
use super::page::{DocumentBuilder, RenderedPdf};

/// Everything the letter mentions about the subject and the request.
pub struct LetterInput<'a> {
    pub employee_name: &'a str,
    pub job_title: &'a str,
    pub employment_status: EmploymentStatus,
    pub hire_date: NaiveDate,
    pub include_salary: bool,
    pub salary_amount: Option<Decimal>,
    pub generated_at: DateTime<Tz>,
    pub request_id: i32,
    pub employee_id: i32,
}

/// `{PREFIX}_EMPLOYMENT_VERIFICATION_{SURNAME}_{YYYYMMDD}.pdf`. The surname
/// keeps letters, digits and underscores, uppercased; anything else is
/// dropped.
#[must_use]
pub fn build_letter_filename(
    prefix: &str,
    employee_last_name: &str,
    generated_on: NaiveDate,
) -> String {
    let safe_last: String = employee_last_name
        .to_uppercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    let safe_last = if safe_last.is_empty() {
        "EMPLOYEE".to_string()
    } else {
        safe_last
    };
    format!(
        "{prefix}_EMPLOYMENT_VERIFICATION_{safe_last}_{}.pdf",
        generated_on.format("%Y%m%d")
    )
}

fn format_phone_for_sentence(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.to_string()
    }
}

/// Renders the letter. Always a single page; the body is short by
/// construction and wrapped to the content width.
pub fn render_letter(
    input: &LetterInput<'_>,
    branding: &BrandingConfig,
    signer: &VerificationConfig,
) -> Result<RenderedPdf> {
    let mut builder = DocumentBuilder::new("Employment Verification Letter");
    builder
        .author(&branding.employer_legal_name)
        .subject(&format!(
            "Employment Verification Request {}",
            input.request_id
        ))
        .keywords(&format!("employee_id:{}", input.employee_id));

    let body_width = content_right() - MARGIN;
    let mut y = PAGE_HEIGHT - MARGIN;

    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        11.0,
        &input.generated_at.format("%B %d, %Y").to_string(),
    );
    y -= LINE_HEIGHT * 2.0;

    builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, "To Whom It May Concern,");
    y -= LINE_HEIGHT * 2.0;

    let employment_phrase = if input.employment_status.is_active() {
        "full-time employment"
    } else {
        "prior employment"
    };
    let paragraph = format!(
        "Please accept this letter as verification of {employment_phrase} with {} \
         for the employee listed below.",
        branding.employer_legal_name
    );
    for line in wrap_words(&paragraph, Font::Helvetica, 11.0, body_width) {
        builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, &line);
        y -= LINE_HEIGHT;
    }
    y -= 6.0;

    let title_label = if input.employment_status.is_active() {
        "Current Job Title"
    } else {
        "Last Job Title"
    };
    let detail_indent = 24.0;
    let mut info_lines = vec![
        format!("Employee Name: {}", input.employee_name),
        format!("Hire Date: {}", input.hire_date.format("%B %d, %Y")),
        format!("{title_label}: {}", input.job_title),
    ];
    if input.include_salary {
        if let Some(salary) = input.salary_amount {
            info_lines.push(format!("Annual Base Salary: {}", format_currency(salary)));
        }
    }
    for line in &info_lines {
        builder.draw_string(MARGIN + detail_indent, y, Font::Helvetica, 11.0, line);
        y -= LINE_HEIGHT + 4.0;
    }
    y -= 2.0;

    let contact_intro = "If you have any questions or need any additional information, \
                         please feel free to contact me at";
    for line in wrap_words(contact_intro, Font::Helvetica, 11.0, body_width) {
        builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, &line);
        y -= LINE_HEIGHT;
    }

    let contact_line = match signer.phone.as_deref() {
        Some(phone) if !phone.is_empty() => format!(
            "{} or you can reach me by email at {}.",
            format_phone_for_sentence(phone),
            signer.signer_email
        ),
        _ => format!("You can reach me by email at {}.", signer.signer_email),
    };
    for line in wrap_words(&contact_line, Font::Helvetica, 11.0, body_width) {
        builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, &line);
        y -= LINE_HEIGHT;
    }

    y -= LINE_HEIGHT;
    builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, "Sincerely,");
    y -= LINE_HEIGHT * 2.0;

    builder.draw_string(MARGIN, y, Font::Helvetica, 16.0, &signer.signer_name);
    y -= LINE_HEIGHT * 2.3;

    let credentials = signer.signer_credentials.trim();
    let signature_line = if credentials.is_empty() {
        signer.signer_name.clone()
    } else {
        format!("{}, {credentials}", signer.signer_name)
    };
    builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, &signature_line);
    y -= LINE_HEIGHT;

    if !signer.signer_title.is_empty() {
        builder.draw_string(MARGIN, y, Font::Helvetica, 11.0, &signer.signer_title);
    }

    let footer_y = 36.0;
    let center = PAGE_WIDTH / 2.0;
    if !signer.footer_address.is_empty() {
        builder.draw_centered_string(
            center,
            footer_y + 24.0,
            Font::Helvetica,
            9.0,
            &signer.footer_address,
        );
    }
    if let Some(phone) = signer.phone.as_deref().filter(|p| !p.is_empty()) {
        let phone_fax = match signer.fax.as_deref().filter(|f| !f.is_empty()) {
            Some(fax) => format!("Phone {phone} | Fax {fax}"),
            None => format!("Phone {phone}"),
        };
        builder.draw_centered_string(center, footer_y + 12.0, Font::Helvetica, 9.0, &phone_fax);
    }
    builder.draw_centered_string(center, footer_y, Font::Helvetica, 9.0, &signer.signer_email);

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn input(status: EmploymentStatus, salary: Option<Decimal>) -> LetterInput<'static> {
        LetterInput {
            employee_name: "Ada Lovelace",
            job_title: "Staff Engineer",
            employment_status: status,
            hire_date: NaiveDate::from_ymd_opt(2019, 6, 3).unwrap(),
            include_salary: salary.is_some(),
            salary_amount: salary,
            generated_at: chrono_tz::America::Los_Angeles
                .with_ymd_and_hms(2024, 3, 15, 9, 30, 0)
                .unwrap(),
            request_id: 5,
            employee_id: 3,
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn filename_keeps_underscores() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            build_letter_filename("EMPLOYER", "de_la Cruz", date),
            "EMPLOYER_EMPLOYMENT_VERIFICATION_DE_LACRUZ_20240315.pdf"
        );
        assert_eq!(
            build_letter_filename("EMPLOYER", "---", date),
            "EMPLOYER_EMPLOYMENT_VERIFICATION_EMPLOYEE_20240315.pdf"
        );
    }

    #[test]
    fn phone_formats_ten_digits() {
        assert_eq!(format_phone_for_sentence("503-555-0100"), "(503) 555-0100");
        assert_eq!(format_phone_for_sentence("+44 20 7946 0958"), "+44 20 7946 0958");
    }

    #[test]
    fn active_letter_mentions_full_time() {
        let rendered = render_letter(
            &input(EmploymentStatus::Active, None),
            &BrandingConfig::default(),
            &VerificationConfig::default(),
        )
        .unwrap();
        assert_eq!(rendered.page_count, 1);
        assert!(contains(&rendered.bytes, "full-time employment"));
        assert!(contains(&rendered.bytes, "Current Job Title"));
    }

    #[test]
    fn former_employee_letter_uses_prior_wording() {
        let rendered = render_letter(
            &input(EmploymentStatus::FormerEmployee, None),
            &BrandingConfig::default(),
            &VerificationConfig::default(),
        )
        .unwrap();
        assert!(contains(&rendered.bytes, "prior employment"));
        assert!(contains(&rendered.bytes, "Last Job Title"));
    }

    #[test]
    fn salary_line_only_when_provided() {
        let with_salary = render_letter(
            &input(EmploymentStatus::Active, Some(dec!(95000))),
            &BrandingConfig::default(),
            &VerificationConfig::default(),
        )
        .unwrap();
        assert!(contains(&with_salary.bytes, "Annual Base Salary"));

        let without = render_letter(
            &input(EmploymentStatus::Active, None),
            &BrandingConfig::default(),
            &VerificationConfig::default(),
        )
        .unwrap();
        assert!(!contains(&without.bytes, "Annual Base Salary"));
    }
}
