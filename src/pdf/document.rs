//! Generic document rendering: a small header block followed by the body,
//! one page per stored document.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::BrandingConfig;
use crate::entities::documents;

use super::layout::{MARGIN, PAGE_HEIGHT};
use super::metrics::Font;
use super::page::{DocumentBuilder, RenderedPdf};

pub fn render_document(
    document: &documents::Model,
    branding: &BrandingConfig,
    generated_at: DateTime<Utc>,
) -> Result<RenderedPdf> {
    let tz: chrono_tz::Tz = branding
        .time_zone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid time zone {:?}: {e}", branding.time_zone))?;
    let local = generated_at.with_timezone(&tz);

    let mut builder = DocumentBuilder::new(&format!("{} Document", branding.project_name));

    let mut y = PAGE_HEIGHT - 32.0;

    builder.draw_string(MARGIN, y, Font::HelveticaBold, 16.0, &branding.project_name);
    y -= 24.0;

    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        11.0,
        &format!("Employer: {}", branding.employer_legal_name),
    );
    y -= 18.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        11.0,
        &format!("Document ID: {}", document.id),
    );
    y -= 18.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        11.0,
        &format!("Title: {}", document.title),
    );
    y -= 18.0;
    builder.draw_string(
        MARGIN,
        y,
        Font::Helvetica,
        11.0,
        &format!("Generated: {}", local.to_rfc3339()),
    );
    y -= 24.0;

    for line in document.body.lines() {
        builder.draw_string(MARGIN, y, Font::Helvetica, 10.0, line);
        y -= 12.0;
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_title_and_body() {
        let document = documents::Model {
            id: 9,
            title: "Offer Letter".to_string(),
            body: "Line one\nLine two".to_string(),
            owner_id: 1,
            created_at: Utc::now(),
            updated_at: None,
        };
        let rendered =
            render_document(&document, &BrandingConfig::default(), Utc::now()).unwrap();
        assert_eq!(rendered.page_count, 1);
        assert!(
            rendered
                .bytes
                .windows(b"Offer Letter".len())
                .any(|w| w == b"Offer Letter")
        );
    }
}
