use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{AccountsConfig, UnknownAccountPolicy};
use crate::domain::{
    Account, DeviceSignal, Error, LedgerStore, LedgerUnit, PaymentPayload, PaymentRequest,
    RiskScorer, TransactionRecord, TransactionStatus,
};
use crate::features::FeatureExtractor;
use crate::policy::{self, Decision, DenialReason};

/// Result of a payment that made it past validation and scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub transaction_id: Uuid,
    pub status: TransactionStatus,
    pub risk_score: f64,
    pub denial: Option<DenialReason>,
    /// Balance after the payment, when the account exists.
    pub balance: Option<Decimal>,
}

impl PaymentOutcome {
    /// Approved and flagged payments complete; denied ones are rejected.
    pub fn is_completed(&self) -> bool {
        self.status != TransactionStatus::Denied
    }

    pub fn message(&self) -> String {
        match self.denial {
            Some(reason) => reason.to_string(),
            None => format!(
                "Transaction {}. Risk Score: {:.2}.",
                self.status, self.risk_score
            ),
        }
    }
}

pub struct Engine<S, L, D>
where
    S: RiskScorer,
    L: LedgerStore,
    D: DeviceSignal,
{
    scorer: S,
    ledger: L,
    extractor: FeatureExtractor<D>,
    accounts: AccountsConfig,
}

impl<S, L, D> Engine<S, L, D>
where
    S: RiskScorer,
    L: LedgerStore,
    D: DeviceSignal,
{
    pub fn new(
        scorer: S,
        ledger: L,
        extractor: FeatureExtractor<D>,
        accounts: AccountsConfig,
    ) -> Self {
        Self {
            scorer,
            ledger,
            extractor,
            accounts,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Validate, score, decide, fund-check and settle one payment.
    ///
    /// Validation and scoring failures return an error and leave no trace in
    /// the ledger. Every other outcome, denials included, is journaled exactly
    /// once in the same unit of work as any debit.
    pub async fn process(&self, payload: PaymentPayload) -> Result<PaymentOutcome, Error> {
        let request = PaymentRequest::try_from(payload)?;
        let features = self.extractor.extract(&request)?;

        let risk_score = self.scorer.score(&features).map_err(|e| {
            error!(account = %request.account_number, error = %e, "Risk scoring failed");
            match e {
                Error::ScoringUnavailable(_) => e,
                other => Error::ScoringUnavailable(other.to_string()),
            }
        })?;
        if !(0.0..=1.0).contains(&risk_score) {
            error!(account = %request.account_number, risk_score, "Scorer returned an out-of-range probability");
            return Err(Error::ScoringUnavailable(format!(
                "risk score {} outside [0, 1]",
                risk_score
            )));
        }

        let decision = policy::decide(risk_score);

        let mut unit = self.ledger.begin().await?;
        let (decision, balance) = self.check_funds(&mut unit, &request, decision).await?;

        let balance = match (decision, balance) {
            (Decision::Approved, Some(_)) => {
                Some(unit.debit(&request.account_number, request.amount).await?)
            }
            (_, balance) => balance,
        };

        let record = TransactionRecord::new(&request, decision.status(), risk_score);
        unit.append_transaction(&record).await?;
        unit.commit().await?;

        let outcome = PaymentOutcome {
            transaction_id: record.id,
            status: record.status,
            risk_score,
            denial: decision.denial_reason(),
            balance,
        };

        match decision {
            Decision::Approved => info!(
                transaction_id = %record.id,
                account = %record.account_number,
                amount = %record.amount,
                risk_score,
                "Transaction approved"
            ),
            Decision::Flagged => warn!(
                transaction_id = %record.id,
                account = %record.account_number,
                amount = %record.amount,
                risk_score,
                "Transaction flagged, requires banker review"
            ),
            Decision::Denied(reason) => info!(
                transaction_id = %record.id,
                account = %record.account_number,
                amount = %record.amount,
                risk_score,
                reason = %reason,
                "Transaction denied"
            ),
        }

        Ok(outcome)
    }

    /// Resolve the account and downgrade the decision if funds do not cover it.
    /// A risk denial keeps its reason and never opens an unknown account.
    async fn check_funds(
        &self,
        unit: &mut L::Unit,
        request: &PaymentRequest,
        decision: Decision,
    ) -> Result<(Decision, Option<Decimal>), Error> {
        let balance = match unit.get_balance(&request.account_number).await {
            Ok(balance) => balance,
            Err(Error::AccountNotFound(_)) => match self.accounts.unknown_account {
                _ if decision.is_denied() => return Ok((decision, None)),
                UnknownAccountPolicy::Reject => {
                    return Ok((Decision::Denied(DenialReason::UnknownAccount), None));
                }
                UnknownAccountPolicy::Open => {
                    let account = Account::new(
                        request.account_number.clone(),
                        self.accounts.default_customer_name.clone(),
                        self.accounts.default_balance,
                    );
                    warn!(
                        account = %account.account_number,
                        balance = %account.current_balance,
                        "Opening unknown account with the simulated default balance"
                    );
                    unit.open_account(&account).await?;
                    account.current_balance
                }
            },
            Err(e) => return Err(e),
        };

        if !decision.is_denied() && balance < request.amount {
            return Ok((Decision::Denied(DenialReason::InsufficientFunds), Some(balance)));
        }

        Ok((decision, Some(balance)))
    }
}
