//! Solidity ABI of the ledger.
//!
//! Entry-point selectors, event topics and custom error selectors all come from
//! this interface, so callers written against the Solidity contract interoperate
//! with any host running [`crate::Whbar`].

use alloy_sol_types::sol;

sol! {
    /// Wrapped native-currency ledger interface.
    interface IWHBAR {
        /// Emitted when native value is wrapped.
        event Deposit(address indexed dst, uint256 wad);
        /// Emitted when wrapped balance is unwrapped and paid out.
        event Withdrawal(address indexed src, uint256 wad);
        /// Emitted on every balance move, including self transfers.
        event Transfer(address indexed src, address indexed dst, uint256 wad);
        /// Emitted when an allowance is set.
        event Approval(address indexed src, address indexed guy, uint256 wad);

        /// The source balance does not cover the amount.
        error InsufficientFunds();
        /// The spender's allowance does not cover the amount.
        error InsufficientAllowance();
        /// The native payout was refused.
        error SendFailed();

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        function deposit() external payable;
        function withdraw(uint256 amount) external;
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
}

pub use IWHBAR::{IWHBARCalls, IWHBARErrors, IWHBAREvents};
