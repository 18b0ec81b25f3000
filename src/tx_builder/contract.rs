//! Launchpad factory ABI
//!
//! Compiled in rather than loaded from a JSON file at startup; only the
//! launch entry point and its event are needed.

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract LaunchpadFactory {
        /// Emitted once per successful launch, by the factory itself
        event TokenLaunched(
            address indexed token,
            address indexed creator,
            string name,
            string symbol,
            uint256 supply
        );

        /// Deploys a bonding-curve token and mints `supply` base units
        function launchToken(string name, string symbol, uint256 supply) external returns (address token);
    }
}

pub use LaunchpadFactory::{launchTokenCall, TokenLaunched};
