//! Token address extraction from mined receipts

use crate::errors::LaunchError;
use crate::tx_builder::TokenLaunched;
use crate::types::Receipt;
use alloy::primitives::Address;
use alloy::sol_types::SolEvent;
use tracing::warn;

/// Finds the factory's `TokenLaunched` event in a receipt
#[derive(Debug, Clone, Copy)]
pub struct EventExtractor {
    factory: Address,
}

impl EventExtractor {
    pub fn new(factory: Address) -> Self {
        Self { factory }
    }

    /// Deployed token address from the first matching log, in log order.
    ///
    /// A reverted receipt is reported as `TransactionReverted` without looking
    /// at its logs. A successful receipt without a decodable launch event
    /// from the factory is `EventNotFound`.
    pub fn extract(&self, receipt: &Receipt) -> Result<Address, LaunchError> {
        if !receipt.is_success() {
            return Err(LaunchError::TransactionReverted {
                tx_hash: receipt.tx_hash,
            });
        }

        for (index, log) in receipt.logs.iter().enumerate() {
            if log.address != self.factory {
                continue;
            }
            if log.data.topics().first() != Some(&TokenLaunched::SIGNATURE_HASH) {
                continue;
            }

            match TokenLaunched::decode_log_data(&log.data) {
                Ok(event) => return Ok(event.token),
                Err(err) => {
                    warn!(
                        tx_hash = %receipt.tx_hash,
                        log_index = index,
                        error = %err,
                        "Skipping undecodable launch event"
                    );
                }
            }
        }

        Err(LaunchError::EventNotFound {
            tx_hash: receipt.tx_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::types::{EventLog, ReceiptStatus};
    use alloy::primitives::{LogData, TxHash, B256, U256};

    const FACTORY: Address = Address::repeat_byte(0xfa);

    fn launch_log(emitter: Address, token: Address) -> EventLog {
        EventLog {
            address: emitter,
            data: TokenLaunched {
                token,
                creator: Address::repeat_byte(0xc0),
                name: "Cool Ape".to_string(),
                symbol: "CAPE".to_string(),
                supply: U256::from(1u64),
            }
            .encode_log_data(),
        }
    }

    fn transfer_log() -> EventLog {
        EventLog {
            address: Address::repeat_byte(0x01),
            data: LogData::new_unchecked(vec![B256::repeat_byte(0xdd)], vec![0u8; 32].into()),
        }
    }

    fn receipt(status: ReceiptStatus, logs: Vec<EventLog>) -> Receipt {
        Receipt {
            tx_hash: TxHash::repeat_byte(0x42),
            status,
            block_number: Some(1),
            logs,
        }
    }

    #[test]
    fn test_extracts_first_matching_token() {
        let first = Address::repeat_byte(0xab);
        let second = Address::repeat_byte(0xcd);
        let r = receipt(
            ReceiptStatus::Success,
            vec![transfer_log(), launch_log(FACTORY, first), launch_log(FACTORY, second)],
        );
        assert_eq!(EventExtractor::new(FACTORY).extract(&r).unwrap(), first);
    }

    #[test]
    fn test_revert_never_reports_missing_event() {
        let r = receipt(ReceiptStatus::Reverted, vec![launch_log(FACTORY, Address::repeat_byte(1))]);
        let err = EventExtractor::new(FACTORY).extract(&r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionReverted);
        assert_eq!(err.tx_hash(), Some(r.tx_hash));
    }

    #[test]
    fn test_success_without_event_is_event_not_found() {
        let r = receipt(ReceiptStatus::Success, vec![transfer_log()]);
        let err = EventExtractor::new(FACTORY).extract(&r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EventNotFound);

        let empty = receipt(ReceiptStatus::Success, vec![]);
        assert_eq!(
            EventExtractor::new(FACTORY).extract(&empty).unwrap_err().kind(),
            ErrorKind::EventNotFound
        );
    }

    #[test]
    fn test_ignores_events_from_other_contracts() {
        let r = receipt(
            ReceiptStatus::Success,
            vec![launch_log(Address::repeat_byte(0x99), Address::repeat_byte(1))],
        );
        assert_eq!(
            EventExtractor::new(FACTORY).extract(&r).unwrap_err().kind(),
            ErrorKind::EventNotFound
        );
    }

    #[test]
    fn test_skips_undecodable_match_and_continues() {
        let broken = EventLog {
            address: FACTORY,
            // Right signature, missing indexed topics and data
            data: LogData::new_unchecked(vec![TokenLaunched::SIGNATURE_HASH], Default::default()),
        };
        let token = Address::repeat_byte(0x77);
        let r = receipt(ReceiptStatus::Success, vec![broken, launch_log(FACTORY, token)]);
        assert_eq!(EventExtractor::new(FACTORY).extract(&r).unwrap(), token);
    }
}
