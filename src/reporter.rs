//! Result reporter: terminal launch state to a chat reply
//!
//! Replies use Telegram's legacy Markdown. Anything the requester typed is
//! escaped before it is interpolated.

use crate::errors::{truncate_message, LaunchError};
use crate::types::{LaunchResult, LaunchedToken};
use alloy::primitives::{TxHash, U256};

/// Formatting mode of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
        }
    }
}

/// Reply payload handed back to the chat collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchResponse {
    pub text: String,
    pub parse_mode: ParseMode,
    pub disable_link_preview: bool,
}

impl LaunchResponse {
    fn markdown(text: String) -> Self {
        Self {
            text,
            parse_mode: ParseMode::Markdown,
            disable_link_preview: true,
        }
    }
}

/// Maps [`LaunchResult`]s to replies
#[derive(Debug, Clone)]
pub struct LaunchReporter {
    explorer_tx_url: String,
    max_error_len: usize,
}

impl LaunchReporter {
    pub fn new(explorer_tx_url: impl Into<String>, max_error_len: usize) -> Self {
        Self {
            explorer_tx_url: explorer_tx_url.into(),
            max_error_len,
        }
    }

    /// Explorer page for a transaction
    pub fn tx_link(&self, tx_hash: &TxHash) -> String {
        format!("{}{}", self.explorer_tx_url, tx_hash)
    }

    pub fn report(&self, result: &LaunchResult) -> LaunchResponse {
        match result.outcome() {
            Ok(token) => self.report_success(token),
            Err(err) => self.report_failure(err),
        }
    }

    fn report_success(&self, token: &LaunchedToken) -> LaunchResponse {
        LaunchResponse::markdown(format!(
            "✅ *Token Launched Successfully!*\n\n\
             Name: {}\n\
             Symbol: {}\n\
             Supply: {}\n\n\
             🔗 Token CA: `{}`\n\
             🔗 Tx: {}\n\n\
             Trading live on bonding curve!\n\
             Auto-migrates at 4.2 ETH raised 🏙️🐒",
            escape_markdown(token.request.name()),
            escape_markdown(token.request.symbol()),
            group_thousands(token.request.supply_whole()),
            token.token_address,
            self.tx_link(&token.tx_hash),
        ))
    }

    fn report_failure(&self, err: &LaunchError) -> LaunchResponse {
        let mut text = match err {
            LaunchError::MalformedRequest { .. } => {
                "❌ Invalid format. Use: Name|Symbol|Supply".to_string()
            }
            LaunchError::InvalidSupply { .. } => "❌ Invalid supply number".to_string(),
            LaunchError::Signing(_) => {
                "❌ Launch failed: the transaction could not be signed. \
                 The operator has been notified."
                    .to_string()
            }
            LaunchError::Broadcast { message, .. } => format!(
                "❌ Launch failed:\n`{}`",
                code_span(&truncate_message(message, self.max_error_len))
            ),
            LaunchError::ConfirmationTimeout { waited_secs, .. } => format!(
                "⏳ Not confirmed within {} seconds.\n\
                 The transaction may still be mined; check the explorer before trying again.",
                waited_secs
            ),
            LaunchError::TransactionReverted { .. } => {
                "❌ Launch failed: the transaction reverted on chain.".to_string()
            }
            LaunchError::EventNotFound { .. } => {
                "⚠️ The transaction succeeded but no launch event was found. \
                 An operator will inspect it."
                    .to_string()
            }
        };

        if let Some(tx_hash) = err.tx_hash() {
            text.push_str("\n\n🔗 Tx: ");
            text.push_str(&self.tx_link(&tx_hash));
        }
        LaunchResponse::markdown(text)
    }
}

/// Greeting for `/start`
pub fn intro_text() -> &'static str {
    "🏙️🐒 *Ape City Launchpad on Base*\n\n\
     Launch memecoins for FREE (gas only)\n\
     Bonding curve → Auto Uniswap V3 migration\n\
     Creator gets 0.1 ETH reward\n\n\
     Use /launch to start!"
}

/// Request format for `/launch`
pub fn usage_text() -> &'static str {
    "Reply with token details:\n\n\
     `Name|Symbol|Supply`\n\n\
     Example:\n\
     `Cool Ape|CAPE|1000000000`"
}

/// Acknowledgement sent before the pipeline runs
pub fn launching_text() -> &'static str {
    "🚀 Launching your token... (10-40 seconds)"
}

/// Escape legacy Markdown control characters
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// Legacy Markdown has no escape inside code spans
fn code_span(text: &str) -> String {
    text.replace('`', "'")
}

/// `1000000000` -> `1,000,000,000`
pub fn group_thousands(value: U256) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LaunchRequest;
    use alloy::primitives::Address;

    fn reporter() -> LaunchReporter {
        LaunchReporter::new("https://basescan.org/tx/", 500)
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(U256::ZERO), "0");
        assert_eq!(group_thousands(U256::from(999u64)), "999");
        assert_eq!(group_thousands(U256::from(1000u64)), "1,000");
        assert_eq!(group_thousands(U256::from(1_000_000_000u64)), "1,000,000,000");
        assert_eq!(group_thousands(U256::from(12_345u64)), "12,345");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("my_token*"), "my\\_token\\*");
        assert_eq!(escape_markdown("[x]`"), "\\[x]\\`");
        assert_eq!(escape_markdown("Cool Ape"), "Cool Ape");
    }

    #[test]
    fn test_success_reply() {
        let tx_hash = TxHash::repeat_byte(0x11);
        let token = Address::repeat_byte(0xab);
        let result = LaunchResult::launched(LaunchedToken {
            request: LaunchRequest::new("Cool_Ape", "CAPE", U256::from(1_000_000_000u64)).unwrap(),
            token_address: token,
            tx_hash,
        });

        let response = reporter().report(&result);
        assert_eq!(response.parse_mode, ParseMode::Markdown);
        assert!(response.disable_link_preview);
        assert!(response.text.contains("Name: Cool\\_Ape"));
        assert!(response.text.contains("Supply: 1,000,000,000"));
        assert!(response.text.contains(&token.to_string()));
        assert!(response
            .text
            .contains(&format!("https://basescan.org/tx/{}", tx_hash)));
    }

    #[test]
    fn test_every_failure_with_hash_links_explorer() {
        let tx_hash = TxHash::repeat_byte(0x22);
        let link = format!("https://basescan.org/tx/{}", tx_hash);
        let failures = vec![
            LaunchError::Broadcast {
                message: "insufficient funds".into(),
                tx_hash: Some(tx_hash),
                rejected: true,
            },
            LaunchError::ConfirmationTimeout {
                tx_hash,
                waited_secs: 200,
            },
            LaunchError::TransactionReverted { tx_hash },
            LaunchError::EventNotFound { tx_hash },
        ];
        for err in failures {
            let text = reporter().report(&LaunchResult::failed(err.clone())).text;
            assert!(text.contains(&link), "{:?} reply lacks link: {}", err.kind(), text);
        }
    }

    #[test]
    fn test_validation_failures() {
        let text = reporter()
            .report(&LaunchResult::failed(LaunchError::malformed("two fields")))
            .text;
        assert_eq!(text, "❌ Invalid format. Use: Name|Symbol|Supply");

        let text = reporter()
            .report(&LaunchResult::failed(LaunchError::InvalidSupply {
                input: "-5".into(),
            }))
            .text;
        assert_eq!(text, "❌ Invalid supply number");
    }

    #[test]
    fn test_signing_failure_has_no_link() {
        let text = reporter()
            .report(&LaunchResult::failed(LaunchError::Signing(
                "gas limit is zero".into(),
            )))
            .text;
        assert!(text.starts_with("❌ Launch failed"));
        assert!(text.contains("operator has been notified"));
        assert!(!text.contains("gas limit"));
        assert!(!text.contains("basescan"));
    }

    #[test]
    fn test_broadcast_message_bounded_and_code_safe() {
        let err = LaunchError::Broadcast {
            message: format!("`boom` {}", "y".repeat(900)),
            tx_hash: None,
            rejected: false,
        };
        let text = LaunchReporter::new("https://basescan.org/tx/", 100)
            .report(&LaunchResult::failed(err))
            .text;
        assert!(text.contains("'boom'"));
        assert!(text.chars().filter(|c| *c == 'y').count() <= 100);
        assert!(!text.contains("basescan"));
    }
}
