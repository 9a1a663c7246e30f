//! Contractor/client price dispute evaluation.
//!
//! The contractor's quote is compared against the estimator's fair price; an
//! optional client expectation is compared against the same reference, and a
//! fixed decision table picks the settlement.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{CURRENCY, PriceQuery};
use crate::error::PricingError;
use crate::estimator::FairPriceEstimator;
use crate::market::market_rates;

/// Percentage bands used by the dispute decision table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisputeThresholds {
    /// Max |quote − fair| (percent of fair) still judged Fair.
    pub fair_band_pct: f64,
    /// Max |expectation − fair| (percent of fair) still judged Reasonable.
    pub client_band_pct: f64,
    /// Max distance of a split-the-difference settlement from fair.
    pub settlement_band_pct: f64,
}

impl Default for DisputeThresholds {
    fn default() -> Self {
        Self {
            fair_band_pct: 10.0,
            client_band_pct: 15.0,
            settlement_band_pct: 15.0,
        }
    }
}

impl DisputeThresholds {
    pub fn is_valid(&self) -> bool {
        [self.fair_band_pct, self.client_band_pct, self.settlement_band_pct]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFairness {
    Fair,
    #[serde(rename = "Above Market")]
    AboveMarket,
    #[serde(rename = "Below Market")]
    BelowMarket,
}

impl PriceFairness {
    pub fn label(self) -> &'static str {
        match self {
            PriceFairness::Fair => "Fair",
            PriceFairness::AboveMarket => "Above Market",
            PriceFairness::BelowMarket => "Below Market",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientAssessment {
    Reasonable,
    #[serde(rename = "Unreasonably Low")]
    UnreasonablyLow,
    #[serde(rename = "Unreasonably High")]
    UnreasonablyHigh,
}

impl ClientAssessment {
    pub fn label(self) -> &'static str {
        match self {
            ClientAssessment::Reasonable => "Reasonable",
            ClientAssessment::UnreasonablyLow => "Unreasonably Low",
            ClientAssessment::UnreasonablyHigh => "Unreasonably High",
        }
    }
}

/// Outcome of the decision table, carrying the amount it recommends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Settlement {
    /// No client expectation was given.
    FairPrice { amount: f64 },
    BothReasonable { amount: f64 },
    ClientReasonable { amount: f64 },
    ContractorJustified { amount: f64 },
    ClientTooHigh { amount: f64 },
    Compromise { amount: f64 },
    FairSettlement { amount: f64 },
}

impl Settlement {
    pub fn amount(self) -> f64 {
        match self {
            Settlement::FairPrice { amount }
            | Settlement::BothReasonable { amount }
            | Settlement::ClientReasonable { amount }
            | Settlement::ContractorJustified { amount }
            | Settlement::ClientTooHigh { amount }
            | Settlement::Compromise { amount }
            | Settlement::FairSettlement { amount } => amount,
        }
    }

    pub fn message(self) -> String {
        match self {
            Settlement::FairPrice { amount } => format!("Recommended fair price: {amount:.2} {CURRENCY}"),
            Settlement::BothReasonable { amount } => format!(
                "Both parties have reasonable expectations. Recommended settlement: {amount:.2} {CURRENCY}"
            ),
            Settlement::ClientReasonable { amount } => {
                format!("Client has reasonable expectations. Recommended settlement: {amount:.2} {CURRENCY}")
            }
            Settlement::ContractorJustified { amount } => format!(
                "Client expectations are below market rates. Contractor's price of {amount:.2} {CURRENCY} is justified."
            ),
            Settlement::ClientTooHigh { amount } => {
                format!("Client expectations are above market rates. Fair settlement: {amount:.2} {CURRENCY}")
            }
            Settlement::Compromise { amount } => format!("Recommended compromise settlement: {amount:.2} {CURRENCY}"),
            Settlement::FairSettlement { amount } => format!("Recommended fair settlement: {amount:.2} {CURRENCY}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeRequest {
    pub query: PriceQuery,
    pub contractor_price: f64,
    pub client_expectation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeResult {
    pub category: String,
    pub location: String,
    pub area_sqm: f64,
    pub complexity_score: f64,
    pub material_quality_score: f64,
    pub contractor_price: f64,
    pub client_expectation: Option<f64>,
    pub predicted_fair_price: f64,
    pub area_adjustment: f64,
    pub area_adjusted_fair_price: f64,
    pub price_difference_percentage: f64,
    pub price_fairness: PriceFairness,
    pub client_difference_percentage: Option<f64>,
    pub client_expectation_assessment: Option<ClientAssessment>,
    pub market_rate_min: f64,
    pub market_rate_max: f64,
    pub market_rate_avg: f64,
    pub recommendation: String,
    pub settlement: Settlement,
    pub resolution: String,
    pub analysis_date: NaiveDate,
    pub currency: String,
}

/// Large jobs are expected to come with a volume discount.
pub fn area_adjustment(area_sqm: f64) -> f64 {
    if area_sqm > 200.0 {
        0.90
    } else if area_sqm > 100.0 {
        0.95
    } else {
        1.0
    }
}

/// `(value − fair) / fair · 100`.
///
/// With a zero fair price any positive value is infinitely above it and zero
/// is no difference at all.
pub fn percent_difference(value: f64, fair: f64) -> f64 {
    if fair == 0.0 {
        if value > 0.0 {
            f64::INFINITY
        } else if value < 0.0 {
            f64::NEG_INFINITY
        } else {
            0.0
        }
    } else {
        (value - fair) / fair * 100.0
    }
}

pub fn classify_fairness(diff_pct: f64, thresholds: &DisputeThresholds) -> PriceFairness {
    if diff_pct.abs() <= thresholds.fair_band_pct {
        PriceFairness::Fair
    } else if diff_pct > thresholds.fair_band_pct {
        PriceFairness::AboveMarket
    } else {
        PriceFairness::BelowMarket
    }
}

pub fn classify_client(diff_pct: f64, thresholds: &DisputeThresholds) -> ClientAssessment {
    if diff_pct.abs() <= thresholds.client_band_pct {
        ClientAssessment::Reasonable
    } else if diff_pct < -thresholds.client_band_pct {
        ClientAssessment::UnreasonablyLow
    } else {
        ClientAssessment::UnreasonablyHigh
    }
}

fn recommendation(fairness: PriceFairness, diff_pct: f64) -> String {
    match fairness {
        PriceFairness::Fair => "The contractor's price is within market expectations.".to_string(),
        PriceFairness::AboveMarket => format!(
            "The contractor's price is {:.1}% above the fair market rate. \
             Consider negotiation or finding alternative quotes.",
            diff_pct.abs()
        ),
        PriceFairness::BelowMarket => format!(
            "The contractor's price is {:.1}% below the fair market rate, which is favorable for the client.",
            diff_pct.abs()
        ),
    }
}

/// Decision table, evaluated top to bottom.
fn settle(
    fair: f64,
    area_adjusted_fair: f64,
    contractor: f64,
    client: Option<(f64, ClientAssessment)>,
    fairness: PriceFairness,
    thresholds: &DisputeThresholds,
) -> Settlement {
    use ClientAssessment as C;
    use PriceFairness as F;

    let Some((expectation, assessment)) = client else {
        return Settlement::FairPrice { amount: fair };
    };
    match (assessment, fairness) {
        (C::Reasonable, F::Fair) => Settlement::BothReasonable { amount: fair },
        (C::Reasonable, _) => Settlement::ClientReasonable {
            amount: area_adjusted_fair,
        },
        (C::UnreasonablyLow, F::Fair | F::BelowMarket) => Settlement::ContractorJustified { amount: contractor },
        (C::UnreasonablyHigh, F::Fair | F::AboveMarket) => Settlement::ClientTooHigh { amount: fair },
        _ => {
            let midpoint = (contractor + expectation) / 2.0;
            if percent_difference(midpoint, fair).abs() <= thresholds.settlement_band_pct {
                Settlement::Compromise { amount: midpoint }
            } else {
                Settlement::FairSettlement { amount: fair }
            }
        }
    }
}

/// Judge a contractor quote (and optionally a client expectation) against the
/// estimator's fair price, with a market snapshot for context.
pub fn evaluate_dispute<E, R>(
    estimator: &E,
    request: &DisputeRequest,
    thresholds: &DisputeThresholds,
    rng: &mut R,
) -> Result<DisputeResult, PricingError>
where
    E: FairPriceEstimator + ?Sized,
    R: Rng + ?Sized,
{
    if !thresholds.is_valid() {
        return Err(PricingError::invalid_input("dispute thresholds must be finite and non-negative"));
    }
    check_price("contractor_price", request.contractor_price)?;
    if let Some(expectation) = request.client_expectation {
        check_price("client_expectation", expectation)?;
    }

    let query = &request.query;
    let fair = estimator.estimate(query)?;
    let market = market_rates(&query.category, &query.location, rng);

    let diff_pct = percent_difference(request.contractor_price, fair);
    let fairness = classify_fairness(diff_pct, thresholds);
    let adjustment = area_adjustment(query.area_sqm);
    let area_adjusted_fair = fair * adjustment;

    let client = request.client_expectation.map(|expectation| {
        let client_diff = percent_difference(expectation, fair);
        (expectation, client_diff, classify_client(client_diff, thresholds))
    });
    let settlement = settle(
        fair,
        area_adjusted_fair,
        request.contractor_price,
        client.map(|(expectation, _, assessment)| (expectation, assessment)),
        fairness,
        thresholds,
    );

    info!(
        category = %query.category,
        location = %query.location,
        fair,
        contractor = request.contractor_price,
        fairness = fairness.label(),
        "dispute evaluated"
    );

    Ok(DisputeResult {
        category: query.category.clone(),
        location: query.location.clone(),
        area_sqm: query.area_sqm,
        complexity_score: query.complexity_score,
        material_quality_score: query.material_quality_score,
        contractor_price: request.contractor_price,
        client_expectation: request.client_expectation,
        predicted_fair_price: fair,
        area_adjustment: adjustment,
        area_adjusted_fair_price: area_adjusted_fair,
        price_difference_percentage: diff_pct,
        price_fairness: fairness,
        client_difference_percentage: client.map(|(_, diff, _)| diff),
        client_expectation_assessment: client.map(|(_, _, assessment)| assessment),
        market_rate_min: market.min_market_rate,
        market_rate_max: market.max_market_rate,
        market_rate_avg: market.avg_market_rate,
        recommendation: recommendation(fairness, diff_pct),
        settlement,
        resolution: settlement.message(),
        analysis_date: chrono::Local::now().date_naive(),
        currency: CURRENCY.to_string(),
    })
}

fn check_price(name: &str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PricingError::invalid_input(format!("{name} must be a non-negative number, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EstimatorKind, PriceQuery};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Always quotes the same price.
    struct Fixed(f64);

    impl FairPriceEstimator for Fixed {
        fn kind(&self) -> EstimatorKind {
            EstimatorKind::Formula
        }
        fn estimate(&self, _: &PriceQuery) -> Result<f64, PricingError> {
            Ok(self.0)
        }
        fn known_categories(&self) -> Vec<String> {
            vec!["Masonry".to_string()]
        }
        fn known_locations(&self) -> Vec<String> {
            vec!["Colombo".to_string()]
        }
    }

    fn run(fair: f64, area: f64, contractor: f64, client: Option<f64>) -> DisputeResult {
        let request = DisputeRequest {
            query: PriceQuery::new("Masonry", "Colombo", area, 5.0, 5.0),
            contractor_price: contractor,
            client_expectation: client,
        };
        let mut rng = StdRng::seed_from_u64(3);
        evaluate_dispute(&Fixed(fair), &request, &DisputeThresholds::default(), &mut rng).unwrap()
    }

    #[test]
    fn quote_equal_to_fair_price_is_fair() {
        let r = run(5000.0, 50.0, 5000.0, None);
        assert_eq!(r.price_fairness, PriceFairness::Fair);
        assert_eq!(r.price_difference_percentage, 0.0);
        assert_eq!(r.recommendation, "The contractor's price is within market expectations.");
        assert_eq!(r.resolution, "Recommended fair price: 5000.00 LKR");
        assert!(r.client_expectation_assessment.is_none());
    }

    #[test]
    fn twenty_percent_over_is_above_market() {
        let r = run(5000.0, 50.0, 6000.0, None);
        assert_eq!(r.price_fairness, PriceFairness::AboveMarket);
        assert!((r.price_difference_percentage - 20.0).abs() < 1e-9);
        assert_eq!(
            r.recommendation,
            "The contractor's price is 20.0% above the fair market rate. \
             Consider negotiation or finding alternative quotes."
        );
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(run(1000.0, 50.0, 1100.0, None).price_fairness, PriceFairness::Fair);
        assert_eq!(run(1000.0, 50.0, 900.0, None).price_fairness, PriceFairness::Fair);
        let below = run(1000.0, 50.0, 850.0, None);
        assert_eq!(below.price_fairness, PriceFairness::BelowMarket);
        assert!(below.recommendation.contains("15.0% below"));
    }

    #[test]
    fn decision_table() {
        // Reasonable client, fair quote.
        let r = run(1000.0, 50.0, 1000.0, Some(1100.0));
        assert_eq!(r.client_expectation_assessment, Some(ClientAssessment::Reasonable));
        assert_eq!(
            r.resolution,
            "Both parties have reasonable expectations. Recommended settlement: 1000.00 LKR"
        );

        // Reasonable client, overpriced quote on a large job: area-adjusted fair.
        let r = run(1000.0, 250.0, 1500.0, Some(1000.0));
        assert_eq!(r.settlement, Settlement::ClientReasonable { amount: 900.0 });
        assert_eq!(r.resolution, "Client has reasonable expectations. Recommended settlement: 900.00 LKR");

        // Lowballing client against a fair quote.
        let r = run(1000.0, 50.0, 1050.0, Some(500.0));
        assert_eq!(r.client_expectation_assessment, Some(ClientAssessment::UnreasonablyLow));
        assert_eq!(
            r.resolution,
            "Client expectations are below market rates. Contractor's price of 1050.00 LKR is justified."
        );

        // Client expecting too much against an overpriced quote.
        let r = run(1000.0, 50.0, 1300.0, Some(1400.0));
        assert_eq!(r.resolution, "Client expectations are above market rates. Fair settlement: 1000.00 LKR");

        // Lowballing client, overpriced quote: midpoint lands near fair.
        let r = run(1000.0, 50.0, 1300.0, Some(800.0));
        assert_eq!(r.settlement, Settlement::Compromise { amount: 1050.0 });
        assert_eq!(r.resolution, "Recommended compromise settlement: 1050.00 LKR");

        // Lowballing client, overpriced quote: midpoint too far from fair.
        let r = run(1000.0, 50.0, 2000.0, Some(600.0));
        assert_eq!(r.resolution, "Recommended fair settlement: 1000.00 LKR");
    }

    #[test]
    fn zero_fair_price_does_not_divide_by_zero() {
        let r = run(0.0, 50.0, 100.0, Some(0.0));
        assert_eq!(r.price_difference_percentage, f64::INFINITY);
        assert_eq!(r.price_fairness, PriceFairness::AboveMarket);
        assert_eq!(r.client_difference_percentage, Some(0.0));
        assert_eq!(r.client_expectation_assessment, Some(ClientAssessment::Reasonable));

        assert_eq!(run(0.0, 50.0, 0.0, None).price_fairness, PriceFairness::Fair);
    }

    #[test]
    fn area_adjustment_steps() {
        assert_eq!(area_adjustment(100.0), 1.0);
        assert_eq!(area_adjustment(100.5), 0.95);
        assert_eq!(area_adjustment(200.0), 0.95);
        assert_eq!(area_adjustment(201.0), 0.90);
    }

    #[test]
    fn market_snapshot_is_ordered() {
        let r = run(5000.0, 50.0, 5000.0, None);
        assert!(r.market_rate_min <= r.market_rate_avg && r.market_rate_avg <= r.market_rate_max);
        assert_eq!(r.currency, "LKR");
    }

    #[test]
    fn negative_quote_is_rejected() {
        let request = DisputeRequest {
            query: PriceQuery::new("Masonry", "Colombo", 10.0, 5.0, 5.0),
            contractor_price: -1.0,
            client_expectation: None,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = evaluate_dispute(&Fixed(10.0), &request, &DisputeThresholds::default(), &mut rng).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }
}
