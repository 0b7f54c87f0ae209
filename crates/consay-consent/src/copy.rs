//! Consent message composition.
//!
//! Pure text rendering: the same inputs always produce byte-identical
//! output. The rendered text is persisted on the event as an immutable
//! audit snapshot, so regenerating with the same inputs must reproduce
//! it, but the stored copy stays authoritative.

use consay_core::models::event::ConsentScope;
use consay_core::models::record::Platform;

/// Inputs for the initial consent ask.
#[derive(Debug, Clone)]
pub struct ConsentCopyParams<'a> {
    pub creator_handle: &'a str,
    pub platform: Platform,
    pub content_url: &'a str,
    pub scope: ConsentScope,
}

/// Inputs for a scope-expansion follow-up ask.
#[derive(Debug, Clone)]
pub struct FollowUpCopyParams<'a> {
    pub creator_handle: &'a str,
    pub original_scope: ConsentScope,
    pub new_scope: ConsentScope,
    pub content_url: &'a str,
}

fn scope_phrase(scope: ConsentScope) -> &'static str {
    match scope {
        ConsentScope::Organic => "share your content on our organic social media posts",
        ConsentScope::PaidAds => "use your content in our paid advertising campaigns",
        ConsentScope::OrganicAndAds => {
            "share your content on our organic social media posts \
             and use it in our paid advertising campaigns"
        }
    }
}

/// Render the message for an initial consent ask.
///
/// When the requested scope covers paid usage, a disclosure clause
/// about paid advertisements is appended to the permission sentence.
pub fn generate_consent_text(params: &ConsentCopyParams<'_>) -> String {
    let paid_clause = if params.scope.includes_paid() {
        ", including using it in paid advertisements across social media platforms"
    } else {
        ""
    };

    format!(
        "Hi {handle}! We'd love to {phrase}.\n\n\
         The content we're referring to is: {url}\n\n\
         This permission would allow us to repost and promote this specific piece of content{paid}.\n\n\
         If you're cool with this, just click the approval link below. \
         You can always reach out if you have questions.\n\n\
         Thanks!",
        handle = params.creator_handle,
        phrase = scope_phrase(params.scope),
        url = params.content_url,
        paid = paid_clause,
    )
}

/// Render the message for a scope-expansion follow-up, referencing the
/// previously approved scope inline (lower-cased labels).
pub fn generate_follow_up_consent_text(params: &FollowUpCopyParams<'_>) -> String {
    format!(
        "Hi {handle}! Quick follow-up about your content ({url}).\n\n\
         You previously approved us to use this for: {original}\n\n\
         We'd now like to expand that to: {new}\n\n\
         If you're okay with this expanded usage, just click the approval link below.\n\n\
         Thanks again!",
        handle = params.creator_handle,
        url = params.content_url,
        original = params.original_scope.label().to_lowercase(),
        new = params.new_scope.label().to_lowercase(),
    )
}
