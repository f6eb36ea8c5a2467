use crate::{
    entities::{tax_rate, TaxRate},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// Computed monetary fields for one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineQuote {
    pub sub_total: Decimal,
    pub shipping_amount: Decimal,
    pub tax_fee: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

impl LineQuote {
    /// Rounds every field to 2 decimal places.
    ///
    /// Only called at persistence/aggregation boundaries; intermediate
    /// arithmetic stays unrounded.
    pub fn rounded(self) -> Self {
        Self {
            sub_total: self.sub_total.round_dp(2),
            shipping_amount: self.shipping_amount.round_dp(2),
            tax_fee: self.tax_fee.round_dp(2),
            service_fee: self.service_fee.round_dp(2),
            total: self.total.round_dp(2),
        }
    }
}

/// Pricing calculator for cart lines.
///
/// All arithmetic uses fixed-point decimals; binary floating point never
/// touches a monetary value.
#[derive(Debug, Clone)]
pub struct PricingService {
    service_fee_percent: Decimal,
}

impl PricingService {
    /// Creates a calculator charging `service_fee_percent` of each line's
    /// sub-total as the marketplace service fee.
    pub fn new(service_fee_percent: u32) -> Self {
        Self {
            service_fee_percent: Decimal::from(service_fee_percent),
        }
    }

    /// Computes the derived monetary fields for one line:
    ///
    /// - sub_total       = unit_price x qty
    /// - shipping_amount = shipping_unit_amount x qty
    /// - tax_fee         = qty x (tax_rate_percent / 100)
    /// - service_fee     = service_fee_percent% of sub_total
    /// - total           = sub_total + shipping_amount + service_fee + tax_fee
    ///
    /// Fails with InvalidInput for a non-positive quantity.
    pub fn quote_line(
        &self,
        unit_price: Decimal,
        qty: i32,
        shipping_unit_amount: Decimal,
        tax_rate_percent: Decimal,
    ) -> Result<LineQuote, ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::InvalidInput(format!(
                "quantity must be positive, got {}",
                qty
            )));
        }

        let qty = Decimal::from(qty);
        let sub_total = unit_price * qty;
        let shipping_amount = shipping_unit_amount * qty;
        let tax_fee = qty * (tax_rate_percent / Decimal::ONE_HUNDRED);
        let service_fee = sub_total * self.service_fee_percent / Decimal::ONE_HUNDRED;
        let total = sub_total + shipping_amount + service_fee + tax_fee;

        Ok(LineQuote {
            sub_total,
            shipping_amount,
            tax_fee,
            service_fee,
            total,
        })
    }

    /// Looks up the tax rate (in percent) for a destination country.
    /// A missing or inactive country yields rate zero.
    pub async fn tax_rate_for_country(
        &self,
        conn: &impl ConnectionTrait,
        country: Option<&str>,
    ) -> Result<Decimal, ServiceError> {
        let Some(country) = country else {
            return Ok(Decimal::ZERO);
        };

        let rate = TaxRate::find()
            .filter(tax_rate::Column::Country.eq(country))
            .filter(tax_rate::Column::Active.eq(true))
            .one(conn)
            .await?;

        Ok(rate
            .map(|r| Decimal::from(r.rate))
            .unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn calculator() -> PricingService {
        PricingService::new(10)
    }

    #[test]
    fn test_line_quote_reference_scenario() {
        // price=100.00, qty=2, shipping=5.00, tax rate 10%
        let quote = calculator()
            .quote_line(dec!(100.00), 2, dec!(5.00), dec!(10))
            .expect("quote should succeed");

        assert_eq!(quote.sub_total, dec!(200.00));
        assert_eq!(quote.shipping_amount, dec!(10.00));
        assert_eq!(quote.tax_fee, dec!(0.20));
        assert_eq!(quote.service_fee, dec!(20.00));
        assert_eq!(quote.total, dec!(230.20));
    }

    #[test]
    fn test_line_quote_zero_tax_rate() {
        let quote = calculator()
            .quote_line(dec!(19.99), 3, dec!(2.50), Decimal::ZERO)
            .expect("quote should succeed");

        assert_eq!(quote.sub_total, dec!(59.97));
        assert_eq!(quote.shipping_amount, dec!(7.50));
        assert_eq!(quote.tax_fee, Decimal::ZERO);
        assert_eq!(quote.service_fee, dec!(5.997));
        assert_eq!(quote.total, dec!(73.467));
    }

    #[test]
    fn test_line_quote_rounded_at_boundary() {
        let quote = calculator()
            .quote_line(dec!(19.99), 3, dec!(2.50), Decimal::ZERO)
            .expect("quote should succeed")
            .rounded();

        assert_eq!(quote.service_fee, dec!(6.00));
        assert_eq!(quote.total, dec!(73.47));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = calculator()
            .quote_line(dec!(10.00), 0, Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = calculator()
            .quote_line(dec!(10.00), -3, Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_service_fee_percent() {
        let quote = PricingService::new(0)
            .quote_line(dec!(50.00), 1, Decimal::ZERO, Decimal::ZERO)
            .expect("quote should succeed");

        assert_eq!(quote.service_fee, Decimal::ZERO);
        assert_eq!(quote.total, dec!(50.00));
    }

    proptest! {
        // sub_total is exact for any 2-dp price and positive quantity; no
        // rounding loss is tolerated.
        #[test]
        fn prop_sub_total_is_exact(cents in 0i64..=10_000_000, qty in 1i32..=10_000) {
            let price = Decimal::new(cents, 2);
            let quote = calculator()
                .quote_line(price, qty, Decimal::ZERO, Decimal::ZERO)
                .expect("positive quantity must quote");
            prop_assert_eq!(quote.sub_total, price * Decimal::from(qty));
        }
    }
}
