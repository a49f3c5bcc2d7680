//! Browser classification and paywall rendering.
//!
//! Browser clients get a human-facing HTML page instead of the raw 402
//! body. Rendering is a prioritized chain: the route's custom HTML wins,
//! then a registered [`PaywallRenderer`], then the inline fallback page.

use gate402::PaymentRequired;

use crate::types::PaywallConfig;

/// Pluggable renderer for human-facing paywall pages.
pub trait PaywallRenderer: Send + Sync {
    /// Renders the paywall page for the given 402 descriptor.
    fn generate_html(&self, required: &PaymentRequired, config: Option<&PaywallConfig>) -> String;
}

/// Classifies a request as coming from a web browser.
///
/// A request is a browser request when its accept header includes an HTML
/// media type AND its user-agent is a non-empty string recognizable as a
/// browser (contains `Mozilla`). Both conditions are required.
///
/// This is a coarse heuristic with known false negatives and positives
/// (e.g. a curl invocation that sets `Accept: text/html` is still
/// classified as an API client because its user-agent is not browser-like).
#[must_use]
pub fn is_browser_request(accept: Option<&str>, user_agent: Option<&str>) -> bool {
    let wants_html = accept.is_some_and(|a| {
        let a = a.to_ascii_lowercase();
        a.contains("text/html") || a.contains("application/xhtml+xml")
    });
    let browser_agent = user_agent.is_some_and(|ua| !ua.is_empty() && ua.contains("Mozilla"));
    wants_html && browser_agent
}

/// Minimal inline paywall page used when neither custom HTML nor a
/// registered renderer is available.
///
/// Embeds the machine-readable descriptor (both the Base64 header encoding
/// and the raw JSON) so programmatic clients that ended up on the HTML path
/// can still recover the payment requirements.
#[must_use]
pub(crate) fn fallback_page(
    required: &PaymentRequired,
    encoded: &str,
    config: Option<&PaywallConfig>,
) -> String {
    let title = config
        .and_then(|c| c.app_name.as_deref())
        .unwrap_or("Payment Required");
    let reason = required.error.as_deref().unwrap_or("Payment required");
    let requirements_json =
        serde_json::to_string_pretty(&required.accepts).unwrap_or_else(|_| "[]".to_owned());

    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<title>402 - {title}</title>\n\
</head>\n\
<body>\n\
<h1>{title}</h1>\n\
<p>{reason}</p>\n\
<p>This resource requires payment. Connect a wallet that speaks the x402\n\
protocol, or retry with a <code>PAYMENT-SIGNATURE</code> header.</p>\n\
<script type=\"application/json\" id=\"x402-payment-required\">{requirements_json}</script>\n\
<script type=\"text/plain\" id=\"x402-payment-required-b64\">{encoded}</script>\n\
</body>\n\
</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    #[test]
    fn browser_needs_both_html_accept_and_browser_agent() {
        assert!(is_browser_request(Some("text/html,*/*"), Some(FIREFOX)));
        assert!(is_browser_request(
            Some("application/xhtml+xml"),
            Some(FIREFOX)
        ));

        assert!(!is_browser_request(Some("application/json"), Some(FIREFOX)));
        assert!(!is_browser_request(Some("text/html"), Some("curl/8.5.0")));
        assert!(!is_browser_request(Some("text/html"), Some("")));
        assert!(!is_browser_request(Some("text/html"), None));
        assert!(!is_browser_request(None, Some(FIREFOX)));
    }

    #[test]
    fn heuristic_misclassifies_html_accepting_non_browsers_as_api_clients() {
        // Documented approximation: an HTTP client that asks for HTML but
        // carries a non-browser user-agent stays on the JSON path.
        assert!(!is_browser_request(Some("text/html"), Some("python-requests/2.32")));
    }

    #[test]
    fn fallback_page_embeds_requirements() {
        let required = PaymentRequired {
            x402_version: 2,
            error: Some("Payment required".into()),
            resource: None,
            accepts: Vec::new(),
            extensions: None,
        };
        let page = fallback_page(&required, "QkFTRTY0", None);
        assert!(page.contains("x402-payment-required"));
        assert!(page.contains("QkFTRTY0"));
        assert!(page.contains("Payment Required"));
    }

    #[test]
    fn fallback_page_uses_configured_app_name() {
        let required = PaymentRequired {
            x402_version: 2,
            error: None,
            resource: None,
            accepts: Vec::new(),
            extensions: None,
        };
        let config = PaywallConfig {
            app_name: Some("Weather API".into()),
            app_logo: None,
            testnet: true,
        };
        let page = fallback_page(&required, "", Some(&config));
        assert!(page.contains("Weather API"));
    }
}
