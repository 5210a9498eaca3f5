use serde::{Deserialize, Serialize};

use ridepool_core::models::PaymentPolicy;
use ridepool_core::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Maximum fare per kilometre of one-way route, in minor currency units.
    ///
    /// Set per deployment in `[pricing]`.
    pub price_per_km: f64,

    /// Display currency for amounts (amounts themselves are minor units).
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_per_km: 50.0,
            currency: "EUR".to_string(),
        }
    }
}

/// Derives the fare ceiling from one-way route distance.
#[derive(Debug, Clone)]
pub struct PriceCapCalculator {
    config: PricingConfig,
}

impl PriceCapCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// `floor(k × distance)`. Non-finite or negative distances count as zero.
    pub fn cap(&self, distance_km: f64) -> i64 {
        let distance = if distance_km.is_finite() { distance_km.max(0.0) } else { 0.0 };
        let rate = if self.config.price_per_km.is_finite() {
            self.config.price_per_km.max(0.0)
        } else {
            0.0
        };
        (rate * distance).floor() as i64
    }

    /// `0 < amount ≤ cap(distance)`
    pub fn validate(&self, amount: i64, distance_km: f64) -> CoreResult<()> {
        if amount <= 0 {
            return Err(CoreError::InvalidPayment(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        let cap = self.cap(distance_km);
        if amount > cap {
            return Err(CoreError::InvalidPayment(format!(
                "amount {} exceeds the cap of {} {} for {:.1} km",
                amount, cap, self.config.currency, distance_km
            )));
        }

        Ok(())
    }

    /// Checks a whole payment policy against the route it is attached to.
    pub fn validate_policy(&self, policy: &PaymentPolicy, distance_km: f64) -> CoreResult<()> {
        if policy.is_free() {
            return Ok(());
        }

        let amount = policy.amount.ok_or_else(|| {
            CoreError::InvalidPayment("an amount is required when payment is requested".to_string())
        })?;
        self.validate(amount, distance_km)?;

        if policy.requires_method() && policy.method.is_none() {
            return Err(CoreError::InvalidPayment(
                "a payment method is required for obligatory payment".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PriceCapCalculator {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepool_core::models::{PaymentMethod, PaymentMode};

    fn calculator(price_per_km: f64) -> PriceCapCalculator {
        PriceCapCalculator::new(PricingConfig {
            price_per_km,
            currency: "EUR".to_string(),
        })
    }

    #[test]
    fn test_ten_km_at_half_unit_per_km() {
        // 0.5 per km expressed in cents
        let calc = calculator(50.0);
        assert_eq!(calc.cap(10.0), 500);
        assert!(matches!(calc.validate(600, 10.0), Err(CoreError::InvalidPayment(_))));
        assert!(calc.validate(500, 10.0).is_ok());
    }

    #[test]
    fn test_amount_must_be_positive() {
        let calc = calculator(50.0);
        assert!(calc.validate(0, 10.0).is_err());
        assert!(calc.validate(-5, 10.0).is_err());
    }

    #[test]
    fn test_cap_is_monotonic() {
        let calc = calculator(37.5);
        let mut previous = calc.cap(0.0);
        for step in 0..2000 {
            let d = step as f64 * 0.137;
            let cap = calc.cap(d);
            assert!(cap >= previous, "cap dropped at {} km", d);
            assert!(calc.validate(cap + 1, d).is_err());
            previous = cap;
        }
    }

    #[test]
    fn test_degenerate_distances() {
        let calc = calculator(50.0);
        assert_eq!(calc.cap(-3.0), 0);
        assert_eq!(calc.cap(f64::NAN), 0);
        assert!(calc.validate(1, f64::INFINITY).is_err());
    }

    #[test]
    fn test_policy_validation() {
        let calc = calculator(50.0);
        assert!(calc.validate_policy(&PaymentPolicy::free(), 0.0).is_ok());

        let missing_amount = PaymentPolicy {
            mode: PaymentMode::Optional,
            amount: None,
            method: None,
        };
        assert!(calc.validate_policy(&missing_amount, 10.0).is_err());

        let optional = PaymentPolicy {
            mode: PaymentMode::Optional,
            amount: Some(300),
            method: None,
        };
        assert!(calc.validate_policy(&optional, 10.0).is_ok());

        let obligatory_without_method = PaymentPolicy {
            mode: PaymentMode::Obligatory,
            amount: Some(300),
            method: None,
        };
        assert!(matches!(
            calc.validate_policy(&obligatory_without_method, 10.0),
            Err(CoreError::InvalidPayment(_))
        ));

        let obligatory = PaymentPolicy {
            method: Some(PaymentMethod::Cash),
            ..obligatory_without_method
        };
        assert!(calc.validate_policy(&obligatory, 10.0).is_ok());
    }
}
