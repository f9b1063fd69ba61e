//! Prompt construction for the analysis call.
//!
//! Centralised so the wording can change in one place and so tests can
//! assert on the exact prompt without a live endpoint. Callers override
//! the (absent by default) system prompt via
//! [`crate::config::ReportConfig::system_prompt`].

/// Build the user prompt embedding location and date verbatim.
///
/// The wording matters: downstream consumers of the PDF expect a
/// description-plus-insights structure, and the location/date context is
/// the only ground truth the model gets besides the photo itself.
pub fn analysis_prompt(location: &str, date: &str) -> String {
    format!(
        "Analyze this image taken at {location} on {date}. \
         Describe what you see and provide insights."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_location_and_date_verbatim() {
        let p = analysis_prompt("Ridge Valley", "2024-03-01");
        assert_eq!(
            p,
            "Analyze this image taken at Ridge Valley on 2024-03-01. \
             Describe what you see and provide insights."
        );
    }
}
