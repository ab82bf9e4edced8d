//! PDF report generation
//!
//! Renders a one-page report for a logged prediction: patient info, model
//! result, interpretation and disclaimer, drawn with absolute-positioned
//! text runs on an A4 page.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::ml::heart::RiskLabel;
use crate::ml::interpret;
use crate::models::{PredictionLog, User};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 20.0;
const LINE_STEP_MM: f32 = 5.0;

#[derive(Debug)]
pub struct ReportError(pub String);

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportError: {}", self.0)
    }
}

impl std::error::Error for ReportError {}

/// Create a PDF report for a heart-disease prediction
pub fn generate_heart_report(user: &User, log: &PredictionLog) -> Result<Vec<u8>, ReportError> {
    let mut page = ReportPage::new("Heart Disease Risk Report")?;

    page.heading("Heart Disease Risk Report");
    page.subtitle("Multi Disease Detection System - Educational AI output");

    page.section("Patient information");
    page.line(&format!("Name: {}", user.username));
    page.line(&format!("Email: {}", user.email));
    page.line(&format!(
        "Report generated from log ID: {} on {}",
        log.id,
        format_datetime(log.created_at)
    ));

    page.section("Model result");
    page.line(&format!("Estimated risk: {}", log.prediction_result));
    page.line(&format!(
        "Model probability: {}",
        probability_to_percent(log.probability)
    ));
    page.line("Model type: Heart disease (tabular classifier)");

    page.section("Input summary");
    for part in log.input_summary.split(',') {
        page.line(part.trim());
    }

    page.section("Interpretation (educational only)");
    let risk_label = risk_label_from_result(&log.prediction_result);
    page.paragraph(interpret::heart_report_explanation(risk_label), 90);

    page.disclaimer(interpret::medical_disclaimer());
    page.finish()
}

/// Create a PDF report for a brain-tumor prediction (4-class model)
pub fn generate_brain_report(user: &User, log: &PredictionLog) -> Result<Vec<u8>, ReportError> {
    let mut page = ReportPage::new("Brain MRI AI Analysis Report")?;

    page.heading("Brain MRI AI Analysis Report");
    page.subtitle("Multi Disease Detection System - Educational AI output");

    page.section("Patient information");
    page.line(&format!("Name: {}", user.username));
    page.line(&format!("Email: {}", user.email));
    page.line(&format!(
        "Report generated from log ID: {} on {}",
        log.id,
        format_datetime(log.created_at)
    ));

    page.section("Model result");
    page.line(&format!("Predicted class: {}", log.prediction_result));
    page.line(&format!(
        "Model probability: {}",
        probability_to_percent(log.probability)
    ));
    page.line("Model type: Brain tumor CNN (4-class: glioma, meningioma, pituitary, no_tumor)");

    page.section("Interpretation (educational only)");
    page.paragraph(interpret::brain_report_explanation(&log.prediction_result), 90);

    page.disclaimer(interpret::medical_disclaimer());
    page.finish()
}

/// One A4 page with a downward-moving text cursor
struct ReportPage {
    doc: printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: f32,
}

impl ReportPage {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError(e.to_string()))?;

        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            y: PAGE_HEIGHT_MM - 20.0,
        })
    }

    fn heading(&mut self, text: &str) {
        self.layer
            .use_text(text, 18.0, Mm(MARGIN_LEFT_MM), Mm(self.y), &self.font_bold);
        self.y -= LINE_STEP_MM;
    }

    fn subtitle(&mut self, text: &str) {
        self.layer
            .use_text(text, 10.0, Mm(MARGIN_LEFT_MM), Mm(self.y), &self.font);
        self.y -= LINE_STEP_MM;
    }

    fn section(&mut self, title: &str) {
        self.y -= LINE_STEP_MM;
        self.layer
            .use_text(title, 12.0, Mm(MARGIN_LEFT_MM), Mm(self.y), &self.font_bold);
        self.y -= LINE_STEP_MM;
    }

    fn line(&mut self, text: &str) {
        self.layer
            .use_text(text, 10.0, Mm(MARGIN_LEFT_MM), Mm(self.y), &self.font);
        self.y -= LINE_STEP_MM;
    }

    fn paragraph(&mut self, text: &str, max_chars: usize) {
        for line in wrap_text(text, max_chars) {
            self.line(&line);
        }
    }

    /// Disclaimer block anchored near the bottom of the page
    fn disclaimer(&mut self, text: &str) {
        let mut y = 25.0;
        for line in wrap_text(text, 95) {
            self.layer
                .use_text(line, 9.0, Mm(MARGIN_LEFT_MM), Mm(y), &self.font);
            y -= 4.0;
        }
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ReportError(e.to_string()))
    }
}

/// Reports are generated from stored label strings; unknown labels read as
/// the lowest tier text rather than failing the download
fn risk_label_from_result(result: &str) -> RiskLabel {
    match result {
        "High" => RiskLabel::High,
        "Medium" => RiskLabel::Medium,
        _ => RiskLabel::Low,
    }
}

/// 'YYYY-MM-DD HH:MM' formatting for report headers
fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Convert stored probability to an '87.0%' style string
fn probability_to_percent(probability: f32) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Naive word-wrap for long paragraphs
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let test_len = if current_line.is_empty() {
            word.len()
        } else {
            current_len + 1 + word.len()
        };

        if test_len <= max_chars {
            current_line.push(word);
            current_len = test_len;
        } else {
            if !current_line.is_empty() {
                lines.push(current_line.join(" "));
            }
            current_line = vec![word];
            current_len = word.len();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "x".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_log(model_type: &str, result: &str) -> PredictionLog {
        PredictionLog {
            id: 42,
            user_id: Uuid::new_v4(),
            model_type: model_type.to_string(),
            input_summary: "age=63, sex=1, cp=3".to_string(),
            prediction_result: result.to_string(),
            probability: 0.87,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_wrap_text_respects_limit() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap_text(text, 15);
        for line in &lines {
            assert!(line.len() <= 15, "line too long: {:?}", line);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_single_long_word() {
        let lines = wrap_text("supercalifragilistic", 5);
        assert_eq!(lines, vec!["supercalifragilistic".to_string()]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert!(wrap_text("", 20).is_empty());
    }

    #[test]
    fn test_probability_to_percent() {
        assert_eq!(probability_to_percent(0.87), "87.0%");
        assert_eq!(probability_to_percent(0.125), "12.5%");
        assert_eq!(probability_to_percent(1.0), "100.0%");
    }

    #[test]
    fn test_format_datetime() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        assert_eq!(format_datetime(dt), "2026-03-14 09:30");
    }

    #[test]
    fn test_risk_label_from_result() {
        assert_eq!(risk_label_from_result("High"), RiskLabel::High);
        assert_eq!(risk_label_from_result("Medium"), RiskLabel::Medium);
        assert_eq!(risk_label_from_result("Low"), RiskLabel::Low);
        assert_eq!(risk_label_from_result("garbage"), RiskLabel::Low);
    }

    #[test]
    fn test_generate_heart_report_produces_pdf() {
        let bytes = generate_heart_report(&sample_user(), &sample_log("heart_disease", "High"))
            .expect("report generation");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_generate_brain_report_produces_pdf() {
        let bytes = generate_brain_report(
            &sample_user(),
            &sample_log("brain_tumor_multiclass", "glioma"),
        )
        .expect("report generation");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }
}
