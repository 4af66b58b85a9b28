//! Billing-cycle state machine
//!
//! Owns every write to a subscription's billing fields: the next billing
//! date, active/cancelled status, and trial fields. Also the only creator of
//! price history records.
//!
//! ```text
//!            pause               cancel
//!   active ─────────▶ paused ─────────▶ cancelled
//!     ▲  ◀───────────   │                  │
//!     │     resume      └──── resume ◀─────┘
//!     │
//!   trialing ── trial ends ──▶ active (converts) | cancelled
//! ```

pub mod cycle;
pub mod machine;

pub use cycle::{advance_billing_date, monthly_equivalent, roll_forward};
pub use machine::{
    cancel, convert_trial, is_due_soon, is_overdue, is_trial_expired, is_trial_expiring, pause,
    resume, validate, BillingEngine, RenewalReport, TrialReport,
};
