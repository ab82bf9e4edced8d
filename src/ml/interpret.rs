//! Result interpretation
//!
//! Fixed branch tables mapping a raw label and probability to the canned
//! explanation text shown with a result or printed in a report. Pure
//! functions, no configuration; changing the wording means redeploying.

use super::heart::RiskLabel;

/// Suggestion text shown alongside a fresh heart-risk result
pub fn heart_suggestion(risk_label: RiskLabel) -> &'static str {
    match risk_label {
        RiskLabel::High => {
            "Your risk is estimated as HIGH. This is not a diagnosis, but you \
             should strongly consider speaking with a cardiologist and getting \
             full medical tests."
        }
        RiskLabel::Medium => {
            "Your risk is estimated as MEDIUM. Consider regular check-ups, \
             monitoring blood pressure and cholesterol, and discussing \
             lifestyle changes with a healthcare professional."
        }
        RiskLabel::Low => {
            "Your risk is estimated as LOW. Maintain a healthy lifestyle, \
             exercise regularly, and keep up with periodic check-ups."
        }
    }
}

/// Suggestion text shown alongside a fresh MRI result
pub fn brain_suggestion(predicted_class: &str, probability: f32) -> String {
    let prob_pct = (probability * 100.0).round() as i64;

    if predicted_class == "no_tumor" {
        return format!(
            "The model's highest confidence class is 'no_tumor' with an \
             estimated probability of about {}%. This does not guarantee that \
             no abnormality exists. If you have any symptoms or concerns, \
             please consult a neurologist or radiologist.",
            prob_pct
        );
    }

    format!(
        "The model suggests the MRI is most consistent with '{}' with an \
         estimated probability of about {}%. This is NOT a clinical \
         diagnosis. You should promptly consult a qualified neurologist or \
         neurosurgeon, and have this MRI evaluated by a radiologist for a \
         professional interpretation.",
        predicted_class, prob_pct
    )
}

/// Report-flavored explanation of a heart risk tier
pub fn heart_report_explanation(risk_label: RiskLabel) -> &'static str {
    match risk_label {
        RiskLabel::High => {
            "The model estimated a HIGH risk of heart disease based on the \
             provided features. This is not a diagnosis. You should strongly \
             consider seeing a cardiologist for full medical tests."
        }
        RiskLabel::Medium => {
            "The model estimated a MEDIUM risk of heart disease. It may be \
             helpful to monitor your blood pressure, cholesterol, and discuss \
             lifestyle changes and screening with a healthcare professional."
        }
        RiskLabel::Low => {
            "The model estimated a LOW risk of heart disease. Maintaining a \
             healthy lifestyle, exercising regularly, and having periodic \
             check-ups is still important."
        }
    }
}

/// Report-flavored explanation of an MRI class. Unknown labels fall through
/// to a cautious catch-all.
pub fn brain_report_explanation(predicted_class: &str) -> &'static str {
    match predicted_class.trim().to_lowercase().as_str() {
        "no_tumor" => {
            "The model did not detect a brain tumor pattern in the MRI image. \
             However, this is only an AI model output and cannot replace a \
             radiologist's professional interpretation."
        }
        "glioma" => {
            "The model pattern is most consistent with a glioma-type tumor. \
             This does NOT confirm a diagnosis. A radiologist and \
             neurospecialist must review the MRI and perform full clinical \
             evaluation."
        }
        "meningioma" => {
            "The model pattern is most consistent with a meningioma-type \
             tumor. This is only an AI pattern suggestion and not a \
             diagnosis. A specialist must confirm any findings."
        }
        "pituitary" => {
            "The model pattern is most consistent with a pituitary-region \
             tumor. This is not a confirmed diagnosis. A radiologist and \
             doctor must interpret the MRI and clinical picture."
        }
        _ => {
            "The model could not clearly map the MRI to one of the expected \
             classes, or the class name is unknown. Only a qualified doctor \
             and radiologist can interpret the scan reliably."
        }
    }
}

/// Disclaimer appended to every generated report
pub fn medical_disclaimer() -> &'static str {
    "This report is generated by an AI-based educational system. All results \
     are approximate and can be wrong. This is NOT a medical diagnosis, \
     prescription, or a substitute for professional medical advice. Always \
     consult a qualified doctor or healthcare provider for any decisions \
     about your health."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_suggestion_branches() {
        assert!(heart_suggestion(RiskLabel::High).contains("HIGH"));
        assert!(heart_suggestion(RiskLabel::Medium).contains("MEDIUM"));
        assert!(heart_suggestion(RiskLabel::Low).contains("LOW"));
    }

    #[test]
    fn test_brain_suggestion_no_tumor() {
        let text = brain_suggestion("no_tumor", 0.87);
        assert!(text.contains("'no_tumor'"));
        assert!(text.contains("87%"));
        assert!(text.contains("does not guarantee"));
    }

    #[test]
    fn test_brain_suggestion_tumor() {
        let text = brain_suggestion("glioma", 0.912);
        assert!(text.contains("'glioma'"));
        assert!(text.contains("91%"));
        assert!(text.contains("NOT a clinical diagnosis"));
    }

    #[test]
    fn test_brain_report_explanation_all_classes() {
        assert!(brain_report_explanation("no_tumor").contains("did not detect"));
        assert!(brain_report_explanation("glioma").contains("glioma"));
        assert!(brain_report_explanation("meningioma").contains("meningioma"));
        assert!(brain_report_explanation("pituitary").contains("pituitary"));
        assert!(brain_report_explanation("something_else").contains("could not clearly map"));
    }

    #[test]
    fn test_brain_report_explanation_normalizes_case() {
        assert_eq!(
            brain_report_explanation(" Glioma "),
            brain_report_explanation("glioma")
        );
    }

    #[test]
    fn test_interpreter_is_deterministic() {
        assert_eq!(brain_suggestion("glioma", 0.5), brain_suggestion("glioma", 0.5));
        assert_eq!(heart_suggestion(RiskLabel::Low), heart_suggestion(RiskLabel::Low));
    }
}
