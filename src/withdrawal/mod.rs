/**
* filename : mod
* author : HAMA
* date: 2025. 6. 2.
* description: 
**/

pub mod model;
pub mod gateway;
pub mod service;
pub mod processor;

pub use model::{PayoutMethod, Withdrawal, WithdrawalStatus};
pub use gateway::{PaymentGateway, PayoutJob, SimulatedGateway};
pub use service::{WithdrawalPolicy, WithdrawalService};
pub use processor::{dispatch_due_withdrawals, run_withdrawal_processor};
