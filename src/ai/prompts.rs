//! Prompts for job extraction.
//!
//! The extrapolation policy lives here, not in the pipeline:
//! responsibilities may be extrapolated from the posting, minimum and
//! preferred qualifications may not. Callers who want a different
//! policy supply their own system prompt through
//! [`crate::ai::JobExtractor::with_system_prompt`].

/// System prompt for extracting structured job data from scraped
/// webpage text.
pub const JOB_EXTRACT_SYSTEM_PROMPT: &str = r#"You are an expert job posting data extractor. Given raw text scraped from a job posting webpage, you extract structured information about the job.

## YOUR APPROACH

1. **Identify the job posting content** among any surrounding navigation, footer, or sidebar text
2. **Extract only explicitly stated information** — do not infer or guess values
3. **Preserve the job description** as clean, well-structured HTML

## EXTRACTION RULES

**Title**: Extract the core job title as written, without department, team, or group suffixes.

**Company**: Extract the company name. If a parent company and subsidiary are both mentioned, use the one that is hiring.

**Locations**: Extract all listed work locations as an array. Include city and state/country. If "Remote" or "Hybrid" is mentioned, include it as a location. Never include legal notices or ordinances.

**Description**: Extract a concise third-person summary of the role as clean HTML using:
- <p> for paragraphs
- <h2> for section headings
- <ul> and <li> for bullet points
- <strong> for emphasis
Use neutral voice (never "we" or "you"). Do NOT include the job title, company name, location, salary, responsibilities, or qualifications — those are separate fields.

**Responsibilities**: Up to 7 short bullet strings. These may be reasonably extrapolated from the role description when not listed verbatim.

**Qualifications**: minimumQualifications and preferredQualifications must be explicitly stated in the posting. Never extrapolate them; omit when absent.

**Job Type**: Map to one of: "FT" (full-time), "PT" (part-time), "C" (contract/contractor/temporary). If not explicitly stated, omit this field.

**Salary**: Extract salary as annual numbers.
- If a range is given (e.g., "$80,000 - $120,000"), use those as min and max
- If a single number is given, use it for both min and max
- If an hourly rate is given, multiply by 2080 to convert to annual
- Round min DOWN and max UP to the nearest $10,000
- If no salary information is present, omit both fields

## OUTPUT

Return a structured JSON object with the extracted fields. Omit any field where the information is not clearly present in the text."#;

/// Build the user prompt embedding the cleaned page text and the
/// field checklist.
pub fn build_job_extract_prompt(page_text: &str) -> String {
    format!(
        r#"Extract structured job posting data from the following webpage text.

## SCRAPED WEBPAGE TEXT:

{page_text}

## INSTRUCTIONS:

Return a JSON object with these fields:
- title: The core job title
- company: The company name
- locations: Array of location strings (e.g., ["San Francisco, CA", "Remote"])
- description: A concise summary of the role (~500 words max) as clean HTML — NOT responsibilities or qualifications
- responsibilities: Array of up to 7 key responsibility strings (omit if not found)
- minimumQualifications: Array of bare-minimum requirement strings (omit if not found)
- preferredQualifications: Array of preferred/strong-candidate quality strings (omit if not found)
- jobType: "FT", "PT", or "C" (omit if unclear)
- workArrangement: "REMOTE", "HYBRID", or "IN_OFFICE" (omit if unclear)
- salaryMin: Minimum annual salary as a number (omit if not mentioned)
- salaryMax: Maximum annual salary as a number (omit if not mentioned)

Only include fields you can confidently extract from the text."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_the_page_text() {
        let prompt = build_job_extract_prompt("UNIQUE-PAGE-MARKER");
        assert!(prompt.contains("UNIQUE-PAGE-MARKER"));
        assert!(prompt.contains("salaryMin"));
        assert!(prompt.contains("workArrangement"));
    }

    #[test]
    fn system_prompt_fixes_the_extrapolation_policy() {
        assert!(JOB_EXTRACT_SYSTEM_PROMPT.contains("extrapolated"));
        assert!(JOB_EXTRACT_SYSTEM_PROMPT.contains("Never extrapolate"));
    }
}
