//! System prompts for LLM-based question answering.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the answering voice (a company
//!    representative answering a tender questionnaire) is defined in exactly
//!    one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled prompt without
//!    touching a real provider.
//!
//! Callers can bypass the scaffold entirely via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here are
//! used only when no override is provided.
//!
//! The scaffold is Swedish because the questions are: the model answers in
//! the language it is asked in, and a questionnaire from a Swedish portal
//! expects Swedish answers.

/// Opening of the company-representative system prompt.
pub const COMPANY_PROMPT_HEADER: &str = "Låtsas att du är en representant för ett företag.\n\n";

/// Minimum length of a usable company profile, in characters.
///
/// Below this the scaffold produces answers with nothing to stand on.
pub const MIN_COMPANY_PROFILE_CHARS: usize = 50;

/// Closing of the company-representative system prompt.
pub const COMPANY_PROMPT_FOOTER: &str = "\n\nSvara koncist på följande fråga.";

/// Assemble the system prompt for a given company profile.
///
/// The profile is free-form text describing the answering company (services,
/// certifications, staffing — whatever the tender answers should draw on).
/// It is trimmed and embedded between [`COMPANY_PROMPT_HEADER`] and
/// [`COMPANY_PROMPT_FOOTER`].
pub fn company_system_prompt(company_profile: &str) -> String {
    format!(
        "{}{}{}",
        COMPANY_PROMPT_HEADER,
        company_profile.trim(),
        COMPANY_PROMPT_FOOTER
    )
}
