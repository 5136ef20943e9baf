use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::FinancingAssumptions;
use crate::error::ReiCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate, MAX_INPUT_MAGNITUDE};
use crate::ReiCalcResult;

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed-rate, level-payment loan schedule.
///
/// Everything is derived from the loan amount, rate and term; queries walk
/// the schedule from period 0 on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amortization {
    pub loan_amount: Money,
    pub annual_rate_percent: Percent,
    pub monthly_rate: Rate,
    pub total_periods: u32,
    pub monthly_payment: Money,
}

/// Interest/principal split of a single monthly payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    /// 1-indexed payment number
    pub period: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

/// Twelve payments rolled up into one loan year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub payments: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// Loan-level totals plus the annual schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSummary {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub total_periods: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    pub annual_schedule: Vec<AmortizationYear>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Standard fixed-rate mortgage payment: P * r(1+r)^n / ((1+r)^n - 1)
///
/// `annual_rate_percent` is in percentage points (6.5 = 6.5%). A zero rate
/// amortises straight-line (`P / n`).
pub fn compute_monthly_payment(
    loan_amount: Money,
    annual_rate_percent: Percent,
    term_years: u32,
) -> ReiCalcResult<Money> {
    validate_loan(loan_amount, annual_rate_percent, term_years)?;
    payment_for(loan_amount, annual_rate_percent, term_years * MONTHS_PER_YEAR)
}

/// Build the full schedule summary for a financing scenario.
pub fn amortize(
    financing: &FinancingAssumptions,
) -> ReiCalcResult<ComputationOutput<AmortizationSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    financing.validate()?;
    let schedule = Amortization::from_financing(financing)?;
    log::debug!(
        "amortize: loan={} rate={}% periods={} payment={}",
        schedule.loan_amount,
        schedule.annual_rate_percent,
        schedule.total_periods,
        schedule.monthly_payment
    );

    let total_interest = schedule.cumulative_interest_paid(schedule.total_periods)?;
    let total_paid = schedule.loan_amount + total_interest;

    if financing.interest_rate_annual_percent.is_zero() && !schedule.loan_amount.is_zero() {
        warnings.push("Interest rate is 0%; loan amortises straight-line".into());
    }

    let output = AmortizationSummary {
        loan_amount: schedule.loan_amount,
        monthly_payment: schedule.monthly_payment,
        annual_debt_service: schedule.annual_debt_service(),
        total_periods: schedule.total_periods,
        total_paid,
        total_interest,
        annual_schedule: schedule.annual_summary(),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fixed-Rate Mortgage Amortization (level monthly payment)",
        financing,
        warnings,
        elapsed,
        output,
    ))
}

impl Amortization {
    pub fn new(
        loan_amount: Money,
        annual_rate_percent: Percent,
        term_years: u32,
    ) -> ReiCalcResult<Self> {
        validate_loan(loan_amount, annual_rate_percent, term_years)?;
        let monthly_rate = monthly_rate(annual_rate_percent);
        let total_periods = term_years * MONTHS_PER_YEAR;
        let monthly_payment = payment_for(loan_amount, annual_rate_percent, total_periods)?;

        Ok(Amortization {
            loan_amount,
            annual_rate_percent,
            monthly_rate,
            total_periods,
            monthly_payment,
        })
    }

    pub fn from_financing(financing: &FinancingAssumptions) -> ReiCalcResult<Self> {
        Amortization::new(
            financing.loan_amount(),
            financing.interest_rate_annual_percent,
            financing.loan_term_years,
        )
    }

    /// Twelve monthly payments.
    pub fn annual_debt_service(&self) -> Money {
        self.monthly_payment * Decimal::from(MONTHS_PER_YEAR)
    }

    /// Outstanding balance after `period` payments (`0` = original loan).
    pub fn remaining_balance(&self, period: u32) -> ReiCalcResult<Money> {
        self.check_period(period)?;
        Ok(self.walk(period).0)
    }

    /// Principal repaid by the first `through` payments.
    pub fn cumulative_principal_paid(&self, through: u32) -> ReiCalcResult<Money> {
        self.check_period(through)?;
        Ok(self.loan_amount - self.walk(through).0)
    }

    /// Interest paid by the first `through` payments.
    pub fn cumulative_interest_paid(&self, through: u32) -> ReiCalcResult<Money> {
        self.check_period(through)?;
        Ok(self.walk(through).1)
    }

    /// Interest/principal split of payment `k` (1-indexed).
    pub fn period(&self, k: u32) -> ReiCalcResult<AmortizationPeriod> {
        if k == 0 {
            return Err(ReiCalcError::InvalidInput {
                field: "period".into(),
                reason: "Payment periods are 1-indexed".into(),
            });
        }
        self.check_period(k)?;
        let (opening, _) = self.walk(k - 1);
        Ok(self.step(k, opening))
    }

    /// Every payment of the loan in order.
    pub fn periods(&self) -> Vec<AmortizationPeriod> {
        let mut rows = Vec::with_capacity(self.total_periods as usize);
        let mut balance = self.loan_amount;
        for k in 1..=self.total_periods {
            let row = self.step(k, balance);
            balance = row.remaining_balance;
            rows.push(row);
        }
        rows
    }

    /// One row per loan year.
    pub fn annual_summary(&self) -> Vec<AmortizationYear> {
        self.periods()
            .chunks(MONTHS_PER_YEAR as usize)
            .enumerate()
            .map(|(i, months)| AmortizationYear {
                year: i as u32 + 1,
                payments: months.iter().map(|m| m.payment).sum(),
                interest: months.iter().map(|m| m.interest).sum(),
                principal: months.iter().map(|m| m.principal).sum(),
                ending_balance: months
                    .last()
                    .map(|m| m.remaining_balance)
                    .unwrap_or(self.loan_amount),
            })
            .collect()
    }

    fn step(&self, k: u32, opening_balance: Money) -> AmortizationPeriod {
        let interest = opening_balance * self.monthly_rate;
        let principal = self.monthly_payment - interest;
        let mut remaining_balance = opening_balance - principal;
        if remaining_balance < Decimal::ZERO {
            remaining_balance = Decimal::ZERO;
        }
        AmortizationPeriod {
            period: k,
            payment: self.monthly_payment,
            interest,
            principal,
            remaining_balance,
        }
    }

    /// Balance and interest paid after `periods` payments.
    fn walk(&self, periods: u32) -> (Money, Money) {
        let mut balance = self.loan_amount;
        let mut interest_paid = Decimal::ZERO;
        for k in 1..=periods {
            let row = self.step(k, balance);
            interest_paid += row.interest;
            balance = row.remaining_balance;
        }
        (balance, interest_paid)
    }

    fn check_period(&self, period: u32) -> ReiCalcResult<()> {
        if period > self.total_periods {
            return Err(ReiCalcError::InvalidInput {
                field: "period".into(),
                reason: format!(
                    "Period {period} is beyond the loan term of {} payments",
                    self.total_periods
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mortgage helpers
// ---------------------------------------------------------------------------

fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / Decimal::ONE_HUNDRED / dec!(12)
}

fn validate_loan(
    loan_amount: Money,
    annual_rate_percent: Percent,
    term_years: u32,
) -> ReiCalcResult<()> {
    if loan_amount < Decimal::ZERO {
        return Err(ReiCalcError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Loan amount must not be negative".into(),
        });
    }
    if loan_amount > MAX_INPUT_MAGNITUDE {
        return Err(ReiCalcError::InvalidInput {
            field: "loan_amount".into(),
            reason: format!("Loan amount must not exceed {MAX_INPUT_MAGNITUDE}"),
        });
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(ReiCalcError::InvalidInput {
            field: "interest_rate_annual_percent".into(),
            reason: "Interest rate must not be negative".into(),
        });
    }
    if annual_rate_percent > MAX_INPUT_MAGNITUDE {
        return Err(ReiCalcError::InvalidInput {
            field: "interest_rate_annual_percent".into(),
            reason: format!("Interest rate must not exceed {MAX_INPUT_MAGNITUDE}%"),
        });
    }
    if term_years == 0 {
        return Err(ReiCalcError::InvalidInput {
            field: "loan_term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }
    if term_years.checked_mul(MONTHS_PER_YEAR).is_none() {
        return Err(ReiCalcError::InvalidInput {
            field: "loan_term_years".into(),
            reason: format!("Loan term of {term_years} years is out of range"),
        });
    }
    Ok(())
}

fn payment_for(
    principal: Money,
    annual_rate_percent: Percent,
    total_months: u32,
) -> ReiCalcResult<Money> {
    if principal.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let monthly_rate = monthly_rate(annual_rate_percent);
    if monthly_rate.is_zero() {
        // Interest-free: straight-line amortisation
        return Ok(principal / Decimal::from(total_months));
    }

    let overflow = || compounding_overflow(annual_rate_percent, total_months);

    // (1 + r)^n via iterative multiplication
    let one_plus_r = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound = compound.checked_mul(one_plus_r).ok_or_else(overflow)?;
    }

    let numerator = principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(compound))
        .ok_or_else(overflow)?;
    let denominator = compound - Decimal::ONE;

    if denominator.is_zero() {
        return Err(ReiCalcError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    Ok(numerator / denominator)
}

/// (1 + r)^n left the decimal range. Above 100% a year the rate is the
/// culprit; below it only a very long term can get there.
fn compounding_overflow(annual_rate_percent: Percent, total_months: u32) -> ReiCalcError {
    let field = if annual_rate_percent > Decimal::ONE_HUNDRED {
        "interest_rate_annual_percent"
    } else {
        "loan_term_years"
    };
    ReiCalcError::InvalidInput {
        field: field.into(),
        reason: format!(
            "{annual_rate_percent}% over {} years compounds beyond the decimal range",
            total_months / MONTHS_PER_YEAR
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_monthly_payment_reference() {
        // $300k at 6.5% over 30 years
        let payment = compute_monthly_payment(dec!(300000), dec!(6.5), 30).unwrap();
        assert_close(payment, dec!(1896.20), dec!(0.01));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let payment = compute_monthly_payment(dec!(360000), Decimal::ZERO, 30).unwrap();
        assert_eq!(payment, dec!(1000));

        let schedule = Amortization::new(dec!(360000), Decimal::ZERO, 30).unwrap();
        assert_eq!(schedule.remaining_balance(120).unwrap(), dec!(240000));
        assert_eq!(schedule.cumulative_interest_paid(360).unwrap(), Decimal::ZERO);
        assert_eq!(schedule.remaining_balance(360).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_loan_has_zero_payment() {
        let payment = compute_monthly_payment(Decimal::ZERO, dec!(6.5), 30).unwrap();
        assert_eq!(payment, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_inputs_fail_fast() {
        let err = compute_monthly_payment(dec!(-1), dec!(6.5), 30).unwrap_err();
        assert!(matches!(err, ReiCalcError::InvalidInput { ref field, .. } if field == "loan_amount"));

        let err = compute_monthly_payment(dec!(100000), dec!(-0.5), 30).unwrap_err();
        assert_eq!(err.field(), Some("interest_rate_annual_percent"));

        let err = compute_monthly_payment(dec!(100000), dec!(6.5), 0).unwrap_err();
        assert_eq!(err.field(), Some("loan_term_years"));
    }

    #[test]
    fn test_compounding_beyond_decimal_range_is_rejected() {
        // 500% a year for 30 years
        let err = compute_monthly_payment(dec!(300000), dec!(500), 30).unwrap_err();
        assert!(matches!(err, ReiCalcError::InvalidInput { .. }));
        assert_eq!(err.field(), Some("interest_rate_annual_percent"));

        // 6.5% a year for 2000 years
        let err = Amortization::new(dec!(300000), dec!(6.5), 2000).unwrap_err();
        assert_eq!(err.field(), Some("loan_term_years"));
    }

    #[test]
    fn test_high_but_representable_rate_still_amortises() {
        let schedule = Amortization::new(dec!(100000), dec!(60), 30).unwrap();
        // Payment converges on interest-only at very high rates
        assert!(schedule.monthly_payment > dec!(5000));
        assert_close(schedule.remaining_balance(360).unwrap(), Decimal::ZERO, dec!(0.01));
    }

    #[test]
    fn test_principal_sums_to_loan() {
        let schedule = Amortization::new(dec!(300000), dec!(6.5), 30).unwrap();
        let rows = schedule.periods();
        assert_eq!(rows.len(), 360);

        let total_principal: Decimal = rows.iter().map(|r| r.principal).sum();
        assert_close(total_principal, dec!(300000), dec!(0.01));
        assert_close(schedule.remaining_balance(360).unwrap(), Decimal::ZERO, dec!(0.01));
    }

    #[test]
    fn test_first_period_split() {
        let schedule = Amortization::new(dec!(300000), dec!(6.5), 30).unwrap();
        let first = schedule.period(1).unwrap();
        // 300000 * 0.065 / 12 = 1625
        assert_close(first.interest, dec!(1625), dec!(0.0000001));
        assert_close(
            first.principal,
            schedule.monthly_payment - dec!(1625),
            dec!(0.0000001),
        );
        assert_eq!(
            first.remaining_balance,
            schedule.remaining_balance(1).unwrap()
        );
    }

    #[test]
    fn test_cumulative_principal_and_interest_reconcile() {
        let schedule = Amortization::new(dec!(240000), dec!(6.5), 30).unwrap();
        let principal = schedule.cumulative_principal_paid(60).unwrap();
        let interest = schedule.cumulative_interest_paid(60).unwrap();
        assert_close(
            principal + interest,
            schedule.monthly_payment * dec!(60),
            dec!(0.000001),
        );
        assert_close(principal, dec!(15333.65), dec!(0.01));
    }

    #[test]
    fn test_period_out_of_range() {
        let schedule = Amortization::new(dec!(100000), dec!(5), 15).unwrap();
        assert!(schedule.remaining_balance(181).is_err());
        assert!(schedule.period(0).is_err());
        assert!(schedule.period(180).is_ok());
    }

    #[test]
    fn test_annual_summary() {
        let schedule = Amortization::new(dec!(300000), dec!(6.5), 30).unwrap();
        let years = schedule.annual_summary();
        assert_eq!(years.len(), 30);
        assert_eq!(years[0].year, 1);
        assert_close(
            years[0].payments,
            schedule.monthly_payment * dec!(12),
            dec!(0.0000001),
        );
        assert_eq!(
            years[4].ending_balance,
            schedule.remaining_balance(60).unwrap()
        );
        // Principal share rises every year on a level-payment loan
        assert!(years[1].principal > years[0].principal);
    }

    #[test]
    fn test_amortize_envelope() {
        let financing = FinancingAssumptions {
            purchase_price: dec!(375000),
            down_payment_percent: dec!(20),
            interest_rate_annual_percent: dec!(6.5),
            loan_term_years: 30,
        };
        let out = amortize(&financing).unwrap();
        let summary = &out.result;

        assert_eq!(summary.loan_amount, dec!(300000));
        assert_eq!(summary.total_periods, 360);
        assert_close(summary.monthly_payment, dec!(1896.20), dec!(0.01));
        assert_close(
            summary.total_paid,
            summary.monthly_payment * dec!(360),
            dec!(0.01),
        );
        assert!(out.warnings.is_empty());
        assert_eq!(
            out.methodology,
            "Fixed-Rate Mortgage Amortization (level monthly payment)"
        );
    }
}
