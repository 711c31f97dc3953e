// src/failover/mod.rs
//! Primary/backup failover for outgoing API requests.
//!
//! Every API call goes through [`FailoverInterceptor::dispatch`], which aims
//! the request at whichever server the state store names as active and, when
//! that attempt fails below the HTTP layer, makes at most one more attempt:
//!
//! ```plaintext
//!                    ┌──────────────────────────────┐
//!   request ───────► │ connectivity probe           │── offline ──► NoConnectivity
//!                    └──────────────────────────────┘
//!                                   │ online
//!                                   ▼
//!                    ┌──────────────────────────────┐
//!                    │ attempt on active server     │── response ─► caller
//!                    └──────────────────────────────┘
//!                                   │ transport failure
//!                   ┌───────────────┴────────────────┐
//!                   ▼ active = primary               ▼ active = backup
//!        ┌─────────────────────┐        ┌──────────────────────────────┐
//!        │ active := backup    │        │ cooldown elapsed?            │── no ──► backup failure
//!        │ attempt on backup   │        │ stamp check time, probe      │
//!        └─────────────────────┘        │ primary; answer => primary   │
//!                                       └──────────────────────────────┘
//! ```
//!
//! Leaving the primary is immediate. Returning to it is rate limited by the
//! recovery cooldown, and a failed recovery probe reports the backup's
//! failure, not its own.

mod interceptor;

#[cfg(test)]
mod tests;

pub use interceptor::FailoverInterceptor;
