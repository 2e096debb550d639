//! # Cash Shift Gate
//!
//! Resolves the branch's OPEN shift once per unit of work. The returned
//! [`CashShift`] is then passed to every ledger write of that operation.
//!
//! ```text
//! create      ── require_open_shift ──► NoOpenShift if none
//! reactivate  ── require_open_shift ──► NoOpenShift if none
//! cancel      ── find_open_shift    ──► None: reversing entries skipped
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{SaleError, SaleResult};
use optica_core::CashShift;
use optica_db::CashShiftRepository;

#[derive(Debug, Clone)]
pub struct CashShiftGate {
    shifts: CashShiftRepository,
}

impl CashShiftGate {
    pub fn new(shifts: CashShiftRepository) -> Self {
        CashShiftGate { shifts }
    }

    /// The branch's open shift.
    ///
    /// ## Errors
    /// `NoOpenShift` with the branch id when the register is closed.
    pub async fn require_open_shift(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        branch_id: &str,
    ) -> SaleResult<CashShift> {
        self.find_open_shift(conn, tenant_id, branch_id)
            .await?
            .ok_or_else(|| SaleError::NoOpenShift {
                branch_id: branch_id.to_string(),
            })
    }

    pub async fn find_open_shift(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        branch_id: &str,
    ) -> SaleResult<Option<CashShift>> {
        let shift = self.shifts.find_open(conn, tenant_id, branch_id).await?;
        debug!(branch_id = %branch_id, shift_id = ?shift.as_ref().map(|s| &s.id), "Resolved cash shift");
        Ok(shift)
    }
}
