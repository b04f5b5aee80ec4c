use super::parser::{SUGGESTIONS_HEADING, SUMMARY_HEADING};

/// Build the consultant prompt from at most `cap` reviews per bucket, in bucket order.
pub fn build_prompt(positive: &[String], negative: &[String], cap: usize) -> String {
    format!(
        r#"You are a business consultant for a coffee shop in Indonesia.
Analyze the following customer reviews.

**Positive Reviews:**
{positive}

**Negative Reviews:**
{negative}

Based on the reviews, provide the following in two distinct sections:

**Section 1: {summary} (Review Summary)**
Summarize the main positive themes and the main negative themes in Bahasa Indonesia.
Format this as a short paragraph for positives and a short paragraph for negatives.

**Section 2: {suggestions} (Actionable Suggestions)**
Based ONLY on the negative reviews, provide 3-4 concrete, actionable suggestions for the business owner to improve.
If there are no negative reviews, state that.
Present these as a bulleted list in Bahasa Indonesia.
"#,
        positive = bullet_list(positive, cap),
        negative = bullet_list(negative, cap),
        summary = SUMMARY_HEADING,
        suggestions = SUGGESTIONS_HEADING,
    )
}

fn bullet_list(reviews: &[String], cap: usize) -> String {
    if reviews.is_empty() {
        return "- N/A".to_string();
    }
    reviews
        .iter()
        .take(cap)
        .map(|r| format!("- {}", r.split_whitespace().collect::<Vec<_>>().join(" ")))
        .collect::<Vec<_>>()
        .join("\n")
}
