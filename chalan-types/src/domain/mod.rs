//! Pure domain types for the chalan service.

mod counter;
mod ids;
mod ledger;
mod money;
mod voucher;

pub use counter::Counter;
pub use ids::{OrgId, RecipientId};
pub use ledger::{
    InstallmentEntry, InstallmentId, InstallmentStatus, Ledger, LedgerId, PaymentEvent,
};
pub use money::Amount;
pub use voucher::{Numbering, Voucher, VoucherId, VoucherStatus};
