use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Dividend, UserAccount},
    events::{DividendPaidEvent, EventProducers},
    settlement::SettlementError,
    traits::LedgerManagement,
};

/// `DividendApi` pays out the dividends allocated by a draw. Paying a dividend credits the user's balance in the same
/// transaction that marks it paid, and a dividend can only be paid once.
pub struct DividendApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for DividendApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DividendApi")
    }
}

impl<B> DividendApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> DividendApi<B>
where B: LedgerManagement
{
    pub async fn pay_dividend(&self, dividend_id: i64) -> Result<(Dividend, UserAccount), SettlementError> {
        let (dividend, account) = self.db.pay_dividend(dividend_id).await?;
        info!(
            "💰️ Dividend {dividend_id} of {} paid to {}. New balance: {}",
            dividend.amount, account.username, account.balance
        );
        self.call_dividend_paid_hook(&dividend, &account).await;
        Ok((dividend, account))
    }

    /// Pays every pending dividend of a lottery. Dividends that were already paid are left alone, so this is safe to
    /// call again after a partial failure.
    pub async fn pay_dividends_for_lottery(
        &self,
        lottery_id: i64,
    ) -> Result<Vec<(Dividend, UserAccount)>, SettlementError> {
        let paid = self.db.pay_pending_dividends(lottery_id).await?;
        info!("💰️ {} dividends paid for lottery {lottery_id}", paid.len());
        for (dividend, account) in &paid {
            self.call_dividend_paid_hook(dividend, account).await;
        }
        Ok(paid)
    }

    async fn call_dividend_paid_hook(&self, dividend: &Dividend, account: &UserAccount) {
        for emitter in &self.producers.dividend_paid_producer {
            trace!("💰️ Notifying dividend paid hook subscribers");
            emitter.publish_event(DividendPaidEvent::new(dividend.clone(), account.clone())).await;
        }
    }
}
