//! Plain-text rendering of a finished analysis.

use radflow::pipeline::PatientInfo;
use radflow::results::RunResult;
use radflow::utils::format_iso8601;
use std::fmt::{self, Write};

const DISCLAIMER: &str = "Disclaimer: This AI-generated report is intended for informational \
purposes only and should not be used as a substitute for professional medical advice, \
diagnosis, or treatment. All findings require verification by a qualified radiologist or \
healthcare provider. The AI model's confidence scores represent probability estimates and \
are not definitive diagnoses.";

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

/// Renders the report shown after a successful run.
pub fn render(result: &RunResult, patient: &PatientInfo) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Radiology AI Report  {}", result.id)?;
    writeln!(out, "Generated {}", format_iso8601(&result.created_at))?;
    writeln!(out)?;

    writeln!(out, "Patient")?;
    writeln!(out, "  ID:          {}", patient.id)?;
    writeln!(out, "  Name:        {}", patient.name)?;
    writeln!(out, "  Age / Sex:   {}Y / {}", patient.age, patient.gender)?;
    writeln!(out, "  Study date:  {}", or_dash(&patient.study_date))?;
    writeln!(out)?;

    writeln!(out, "Study")?;
    writeln!(out, "  Modality:    {}", or_dash(&patient.modality))?;
    writeln!(out, "  Accession:   {}", or_dash(&patient.accession_number))?;
    writeln!(out, "  Referred by: {}", or_dash(&patient.referring_physician))?;
    writeln!(out, "  AI model:    {}", result.model_name)?;
    writeln!(out)?;

    writeln!(out, "Findings")?;
    for finding in &result.findings {
        writeln!(
            out,
            "  {:>3.0}%  {:<8}  {}",
            finding.probability * 100.0,
            finding.severity,
            finding.condition
        )?;
        writeln!(out, "         {}", finding.description)?;
        if let Some(location) = &finding.location {
            writeln!(out, "         Location: {location}")?;
        }
    }
    writeln!(out)?;

    writeln!(out, "Overall confidence: {:.1}%", result.confidence * 100.0)?;
    writeln!(out, "Processing time:    {:.2} seconds", result.processing_time)?;
    writeln!(out)?;
    write!(out, "{DISCLAIMER}")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radflow::registry::ModelCatalog;
    use radflow::results::{CannedResultSynthesizer, ResultSynthesizer};
    use std::time::Duration;

    #[test]
    fn test_report_contains_patient_findings_and_disclaimer() {
        let model = ModelCatalog::default().get("densenet-multi").unwrap().clone();
        let result = CannedResultSynthesizer::default()
            .with_seed(3)
            .synthesize(&model, Duration::from_millis(8123), &[]);
        let patient = PatientInfo::new("PAT-7", "Jane Roe", 61);

        let text = render(&result, &patient).unwrap();

        assert!(text.contains(&result.id));
        assert!(text.contains("Jane Roe"));
        assert!(text.contains("61Y / male"));
        assert!(text.contains("Accession:   -"));
        assert!(text.contains("DenseNet-121 Multi-Label Classifier"));
        assert!(text.contains("8.12 seconds"));
        for finding in &result.findings {
            assert!(text.contains(&finding.condition));
        }
        assert!(text.ends_with("are not definitive diagnoses."));
    }
}
