//! System prompt assembly for Gabi.
//!
//! Pure string templating: the user's monthly income and tax preference
//! are substituted into a fixed instruction, and exactly one of three
//! tax-answer policies is selected. No arithmetic happens here — the 8%
//! estimate is computed by the model itself, per the product's design.

use super::request::{ChatRequest, TaxPreference};

/// Marker used in the prompt when the user has not picked a tax method
pub const PREFERENCE_NOT_SET: &str = "Not set";

/// Builds the complete system instruction for one request
pub fn build_system_prompt(request: &ChatRequest) -> String {
    let income = format_peso(request.monthly_income);
    let preference = match request.tax_preference {
        None => PREFERENCE_NOT_SET,
        Some(TaxPreference::EightPercent) => "8_percent",
        Some(TaxPreference::Graduated) => "graduated",
    };

    let mut prompt = String::new();

    // 1. Persona and audience
    prompt.push_str("You are Gabi, a warm and practical financial assistant for Filipino ");
    prompt.push_str("freelancers and small business owners. You answer tax and budgeting ");
    prompt.push_str("questions in simple, reassuring language. Keep answers short; add ");
    prompt.push_str("detail only when the user asks for it.\n\n");

    // 2. Financial context for this user
    prompt.push_str(&format!("User's current monthly income: ₱{income}\n"));
    prompt.push_str(&format!("User's tax preference: {preference}\n\n"));

    // 3. Tax answering policy (exactly one branch applies)
    match request.tax_preference {
        None => {
            prompt.push_str(
                "The user has not chosen a tax computation method yet. Before giving \
                 any tax figure, ask them to choose between: (a) the 8% flat tax on \
                 gross income, which comes with a ₱250,000 annual exemption, and \
                 (b) the graduated income tax computed on profit after expenses. \
                 Do not attempt a numeric tax estimate until they have chosen.",
            );
        }
        Some(TaxPreference::EightPercent) => {
            prompt.push_str(&format!(
                "The user follows the 8% flat tax on gross income. When they ask \
                 about tax dues, compute 8% of their monthly income of ₱{income} and \
                 present the result clearly labeled as an estimate, reminding them \
                 that the first ₱250,000 of annual income is exempt.",
            ));
        }
        Some(TaxPreference::Graduated) => {
            prompt.push_str(
                "The user follows the graduated income tax, which is computed on \
                 profit. Explain that an exact figure requires their expense records, \
                 and do not compute an exact amount; describe how the method works \
                 instead.",
            );
        }
    }

    // 4. Guardrails
    prompt.push_str(
        "\n\nNever present an estimate as official BIR advice. Encourage the user \
         to keep their income and expense logs up to date so estimates stay useful.",
    );

    prompt
}

/// Renders a peso amount without float noise: whole amounts lose the
/// decimals, fractional ones keep two places
fn format_peso(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{amount:.2}")
    }
}
