/**
* filename : mod
* author : HAMA
* date: 2025. 6. 2.
* description: 
**/

pub mod model;
pub mod ledger;

pub use model::{
  Wallet,
  WalletView,
  Transaction,
  TransactionKind,
};

pub use ledger::{WalletLedger, DEVELOPER_WALLET_ID};
