//! What the assistant says.

pub const GREETING: &str =
    "Hello! Thank you for calling customer support. How can I help you today?";

pub const CAPABILITIES: &str = "I can help with password resets, billing questions, \
technical problems and account access. If I can't solve something right away, I can create \
a support ticket so our team can follow up. What can I help you with?";

pub const REPROMPT: &str = "Sorry, I didn't catch that. Could you please repeat it?";

pub const NO_ARTICLE_FOUND: &str = "I couldn't find an answer to that in our help center. \
I can create a support ticket so a specialist can help. What's the best email address or \
phone number to reach you?";

pub const KNOWLEDGE_BASE_UNAVAILABLE: &str = "Our help center is unavailable right now, but I \
can still create a support ticket for you. What's the best email address or phone number to \
reach you?";

pub const HUMAN_REQUESTED: &str = "I'll get you to our support team by creating a ticket. \
What's your email address?";

pub const GLAD_TO_HELP: &str = "Glad I could help! Is there anything else I can help you with?";

pub const SOLUTION_DENIED: &str = "I'm sorry that didn't solve your problem. Let me create a \
support ticket for you. What's the best email address or phone number to reach you?";

pub const ASK_FOR_DETAIL: &str =
    "Could you tell me a little more about what's happening, so I can look for a better answer?";

pub const ASK_CONTACT_AGAIN: &str = "I still need a way for our team to reach you. Please say \
your email address, for example john dot smith at gmail dot com, or your phone number.";

pub const INVALID_CONTACT: &str = "That email address or phone number doesn't look valid. \
Could you please say it again?";

pub const TICKET_FAILED: &str = "I'm having trouble creating your ticket right now. \
Could you please try again in a moment?";

pub const WHAT_ELSE: &str = "Sure. What else can I help you with?";

pub const REENGAGE: &str = "I'm happy to help with something else. What's going on?";

pub const FAREWELL: &str = "Thank you for calling. Have a great day. Goodbye!";

pub const APOLOGY: &str = "I'm sorry, something went wrong on my end. I can create a support \
ticket for you if you share your email address or phone number.";

pub fn solution(summary: &str) -> String {
    format!("{} Was this helpful?", summary.trim())
}

pub fn ticket_created(ticket_id: &str) -> String {
    format!(
        "I've created support ticket {}. Our team will contact you soon. \
         Is there anything else I can help you with?",
        ticket_id
    )
}

pub fn farewell_with_ticket(ticket_id: &str) -> String {
    format!(
        "I've created support ticket {} so our team can follow up. {}",
        ticket_id, FAREWELL
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solution_asks_for_feedback() {
        assert_eq!(
            solution("Click Forgot Password. "),
            "Click Forgot Password. Was this helpful?"
        );
    }

    #[test]
    fn ticket_created_mentions_id() {
        let text = ticket_created("tick-1a2b3c4d");
        assert!(text.contains("tick-1a2b3c4d"));
        assert!(text.contains("anything else"));
    }

    #[test]
    fn farewell_with_ticket_ends_with_goodbye() {
        assert!(farewell_with_ticket("42").ends_with("Goodbye!"));
    }
}
