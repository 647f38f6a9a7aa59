//! Fixed prompts for the classifier and the procurement agent.

use quartermaster_tools::{CHECK_APPROVAL, CONSULT_MEMORY, SEARCH_VENDORS};

/// Build the intent classification prompt for `user_input`.
pub fn classification_prompt(user_input: &str) -> String {
    format!(
        "Classify the following user input into one of these categories:\n\
1. STORE_FACT: The user is defining a rule, limit, preference, or fact about a site.\n\
2. PROCUREMENT_REQUEST: The user is asking to buy, order, or procure something.\n\
3. CHAT: General conversation (hello, thanks, etc.).\n\n\
Input: \"{user_input}\"\n\n\
Return ONLY the Category Name (STORE_FACT, PROCUREMENT_REQUEST, or CHAT)."
    )
}

/// System instruction for the procurement agent.
pub fn agent_instruction() -> String {
    format!(
        "You are an Intelligent Procurement Agent.\n\
Your process:\n\
1. ALWAYS use {CONSULT_MEMORY} to check for site rules (budget limits, banned vendors).\n\
2. Use {SEARCH_VENDORS} to find prices.\n\
3. Compare costs against limits found in memory. You may use {CHECK_APPROVAL} for the comparison.\n\
4. If Total Cost > Limit OR Vendor is Banned -> Set status to PAUSE_APPROVAL_NEEDED.\n\n\
Output format: You MUST explain your reasoning in the response text, AND conclude with a JSON block:\n\
```json\n\
{{\"selected_vendor\": \"...\", \"price_per_unit\": ..., \"total_cost\": ..., \
\"status\": \"ORDER_PLACED\" or \"PAUSE_APPROVAL_NEEDED\", \"reasoning\": \"...\"}}\n\
```\n\
For general conversation, answer briefly and do not output a JSON block."
    )
}
